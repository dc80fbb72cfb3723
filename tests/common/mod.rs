#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use issuelens::GitLabConfig;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::{MockServer, ResponseTemplate};

pub const TOKEN: &str = "glpat-test-token";

pub fn issuelens_binary() -> &'static str {
    env!("CARGO_BIN_EXE_issuelens")
}

/// Runs the binary against an isolated config file
pub struct IssueLensTest {
    pub temp_dir: TempDir,
    config_path: PathBuf,
}

impl IssueLensTest {
    /// No config file at all.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.yaml");
        IssueLensTest {
            temp_dir,
            config_path,
        }
    }

    /// Config pointing at `url` with the test token.
    pub fn with_server(url: &str) -> Self {
        let test = Self::new();
        test.write_config(&format!(
            "url: {url}\ntoken: {TOKEN}\nper_page: 20\nsearch_debounce_ms: 10\n"
        ));
        test
    }

    pub fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).expect("Failed to write config file");
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(issuelens_binary())
            .args(args)
            .env("ISSUELENS_CONFIG", &self.config_path)
            .env_remove("GITLAB_URL")
            .env_remove("GITLAB_TOKEN")
            .env("NO_COLOR", "1")
            .current_dir(self.temp_dir.path())
            .output()
            .expect("Failed to execute issuelens command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

pub fn config_for(server: &MockServer) -> GitLabConfig {
    GitLabConfig::new(&server.uri(), TOKEN).expect("valid test config")
}

pub fn user_json(id: u64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "name": format!("{username} name"),
        "state": "active",
        "avatar_url": null,
        "web_url": format!("https://gitlab.example.com/{username}"),
    })
}

pub fn issue_json(project_id: u64, iid: u64, description: &str) -> Value {
    json!({
        "id": project_id * 1000 + iid,
        "iid": iid,
        "project_id": project_id,
        "title": format!("Issue {iid}"),
        "description": description,
        "state": "opened",
        "created_at": "2024-03-01T10:00:00.000Z",
        "updated_at": "2024-03-02T10:00:00.000Z",
        "closed_at": null,
        "labels": ["bug"],
        "milestone": null,
        "author": user_json(1, "alice"),
        "assignee": null,
        "assignees": [],
        "web_url": format!("https://gitlab.example.com/g/p/-/issues/{iid}"),
        "time_stats": {
            "time_estimate": 0,
            "total_time_spent": 0,
            "human_time_estimate": null,
            "human_total_time_spent": null
        },
        "task_completion_status": { "count": 0, "completed_count": 0 }
    })
}

pub fn detail_json(project_id: u64, iid: u64, description: &str) -> Value {
    let mut value = issue_json(project_id, iid, description);
    let extra = json!({
        "user_notes_count": 2,
        "merge_requests_count": 0,
        "upvotes": 1,
        "downvotes": 0,
        "due_date": null,
        "confidential": false,
        "discussion_locked": null,
        "issue_type": "issue",
        "blocking_issues_count": 0,
        "has_tasks": false,
        "references": {
            "short": format!("#{iid}"),
            "relative": format!("#{iid}"),
            "full": format!("g/p#{iid}")
        }
    });
    if let (Some(target), Value::Object(extra)) = (value.as_object_mut(), extra) {
        target.extend(extra);
    }
    value
}

pub fn note_json(id: u64, body: &str, created_at: &str, system: bool) -> Value {
    json!({
        "id": id,
        "body": body,
        "author": user_json(2, "bob"),
        "created_at": created_at,
        "updated_at": created_at,
        "system": system,
        "type": null,
        "noteable_iid": 1,
        "resolvable": false,
        "confidential": false,
        "internal": false
    })
}

pub fn project_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "name_with_namespace": format!("Group / {name}"),
        "path": name.to_lowercase(),
        "path_with_namespace": format!("group/{}", name.to_lowercase()),
        "description": null,
        "web_url": format!("https://gitlab.example.com/group/{}", name.to_lowercase()),
        "star_count": 0,
        "forks_count": 0,
        "last_activity_at": "2024-03-02T10:00:00.000Z"
    })
}

/// JSON body with GitLab's pagination headers
pub fn paged(body: Value, total: u64, total_pages: u32, page: u32, per_page: u32) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(body)
        .insert_header("X-Total", total.to_string().as_str())
        .insert_header("X-Total-Pages", total_pages.to_string().as_str())
        .insert_header("X-Page", page.to_string().as_str())
        .insert_header("X-Per-Page", per_page.to_string().as_str())
}
