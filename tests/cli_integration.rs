
use mock_server::{MockMailServer, USER};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

struct CliHarness {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    server: MockMailServer,
    _dir: tempfile::TempDir,
}

impl CliHarness {
    fn start() -> Self {
        Self::start_with(MockMailServer::start(), "")
    }

    fn start_with(server: MockMailServer, mail_config: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");

        let config_content = format!(
            r#"[account.test]
base_url = "{}"
user = "{}"

[mail]
{}
"#,
            server.url(),
            USER,
            mail_config
        );
        std::fs::write(&config_path, config_content).expect("write config");

        let mut child = Command::new(env!("CARGO_BIN_EXE_mailpane"))
            .arg("--cli")
            .arg(format!("--config={}", config_path.display()))
            .env("XDG_STATE_HOME", dir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn mailpane --cli");

        let stdin = child.stdin.take().expect("take stdin");
        let stdout = child.stdout.take().expect("take stdout");

        CliHarness {
            child,
            stdin,
            reader: BufReader::new(stdout),
            server,
            _dir: dir,
        }
    }

    fn send(&mut self, cmd: Value) -> Value {
        let line = serde_json::to_string(&cmd).expect("serialize command");
        writeln!(self.stdin, "{}", line).expect("write to stdin");
        self.stdin.flush().expect("flush stdin");

        let mut response_line = String::new();
        self.reader
            .read_line(&mut response_line)
            .expect("read response");
        serde_json::from_str(response_line.trim()).expect("parse response JSON")
    }

    fn puts_for(&self, id: u64) -> Vec<Value> {
        self.server
            .requests_matching("PUT", &format!("/emails/{}", id))
            .iter()
            .map(|r| r.json())
            .collect()
    }
}

impl Drop for CliHarness {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn notice_texts(resp: &Value, kind: &str) -> Vec<String> {
    resp["notices"]
        .as_array()
        .expect("notices array")
        .iter()
        .filter(|n| n["kind"] == kind)
        .filter_map(|n| n["text"].as_str().map(str::to_string))
        .collect()
}

fn row_ids(resp: &Value) -> Vec<u64> {
    resp["mailbox"]["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .filter_map(|r| r["id"].as_u64())
        .collect()
}

#[test]
fn test_startup_shows_inbox() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "status"}));

    assert_eq!(resp["ok"], true);
    assert_eq!(resp["panel"], "mailbox");
    assert_eq!(resp["user"], USER);
    assert_eq!(resp["mailbox"]["name"], "inbox");
    assert_eq!(resp["mailbox"]["loading"], false);
    assert_eq!(row_ids(&resp), vec![1, 2]);
    assert_eq!(resp["mailbox"]["rows"][0]["read"], false);
    assert_eq!(resp["mailbox"]["rows"][1]["read"], true);
}

#[test]
fn test_load_each_mailbox() {
    let mut h = CliHarness::start();

    let resp = h.send(json!({"command": "load_mailbox", "mailbox": "sent"}));
    assert_eq!(resp["mailbox"]["title"], "Sent");
    assert_eq!(row_ids(&resp), vec![3]);

    let resp = h.send(json!({"command": "load_mailbox", "mailbox": "archive"}));
    assert_eq!(resp["mailbox"]["title"], "Archive");
    assert_eq!(row_ids(&resp), vec![4]);

    let resp = h.send(json!({"command": "load_mailbox", "mailbox": "spam"}));
    assert_eq!(resp["ok"], false);
}

#[test]
fn test_open_unread_marks_read_once() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "open_message", "id": 1}));

    assert_eq!(resp["panel"], "detail");
    assert_eq!(resp["detail"]["message"]["subject"], "Meeting");
    assert_eq!(resp["detail"]["message"]["sender"], "alice@example.com");

    assert!(h
        .server
        .wait_for(|reqs| reqs.iter().any(|r| r.method == "PUT")));
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(h.puts_for(1), vec![json!({"read": true})]);
}

#[test]
fn test_open_read_message_sends_no_update() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "open_message", "id": 2}));
    assert_eq!(resp["panel"], "detail");

    std::thread::sleep(Duration::from_millis(300));
    assert!(h.puts_for(2).is_empty());
}

#[test]
fn test_archive_toggle_twice() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "open_message", "id": 2}));
    assert_eq!(resp["detail"]["archive"]["label"], "Archive");
    assert_eq!(resp["detail"]["archive"]["style"], "warning");

    let resp = h.send(json!({"command": "toggle_archive"}));
    assert_eq!(resp["detail"]["archive"]["label"], "Unarchive");
    assert_eq!(resp["detail"]["archive"]["style"], "danger");

    let resp = h.send(json!({"command": "toggle_archive"}));
    assert_eq!(resp["detail"]["archive"]["label"], "Archive");
    assert!(notice_texts(&resp, "error").is_empty());

    assert_eq!(
        h.puts_for(2),
        vec![json!({"archived": true}), json!({"archived": false})]
    );
}

#[test]
fn test_archived_message_offers_unarchive() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "open_message", "id": 4}));
    assert_eq!(resp["detail"]["archive"]["label"], "Unarchive");
}

#[test]
fn test_own_message_has_no_archive_control() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "open_message", "id": 3}));
    assert_eq!(resp["panel"], "detail");
    assert!(resp["detail"]["archive"].is_null());

    let resp = h.send(json!({"command": "toggle_archive"}));
    assert!(resp["detail"]["archive"].is_null());
    assert!(h.puts_for(3).is_empty());
}

#[test]
fn test_missing_message_falls_back_to_inbox() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "open_message", "id": 99}));

    assert_eq!(resp["panel"], "mailbox");
    assert_eq!(resp["mailbox"]["name"], "inbox");
    assert_eq!(row_ids(&resp), vec![1, 2]);
    assert_eq!(notice_texts(&resp, "error"), vec!["Email not found."]);
}

#[test]
fn test_reply_prefills_form() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "reply", "id": 1}));

    assert_eq!(resp["panel"], "compose");
    assert_eq!(resp["compose"]["recipients"], "alice@example.com");
    assert_eq!(resp["compose"]["subject"], "Re: Meeting");
    assert_eq!(
        resp["compose"]["body"],
        "\n\nOn Jan 1 2025, 10:30 AM alice@example.com wrote:\n\nBody of Meeting\n\nSecond paragraph"
    );
}

#[test]
fn test_reply_keeps_existing_prefix() {
    let mut h = CliHarness::start();
    h.send(json!({"command": "open_message", "id": 2}));
    let resp = h.send(json!({"command": "reply"}));

    assert_eq!(resp["panel"], "compose");
    assert_eq!(resp["compose"]["subject"], "Re: Lunch");
}

#[test]
fn test_send_success_reopens_empty_form() {
    let mut h = CliHarness::start();
    h.send(json!({"command": "compose"}));
    let resp = h.send(json!({
        "command": "send",
        "recipients": "alice@example.com",
        "subject": "Hello",
        "body": "Hi Alice"
    }));

    assert_eq!(resp["panel"], "compose");
    assert_eq!(resp["compose"]["recipients"], "");
    assert_eq!(resp["compose"]["subject"], "");
    assert_eq!(resp["compose"]["sending"], false);
    assert_eq!(
        notice_texts(&resp, "success"),
        vec!["Email sent successfully."]
    );

    let posts = h.server.requests_matching("POST", "/emails");
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].json(),
        json!({"recipients": "alice@example.com", "subject": "Hello", "body": "Hi Alice"})
    );
}

#[test]
fn test_send_error_keeps_form() {
    let mut h = CliHarness::start();
    h.send(json!({"command": "compose"}));
    let resp = h.send(json!({
        "command": "send",
        "recipients": "nobody@example.com",
        "subject": "Hello",
        "body": "Anyone?"
    }));

    assert_eq!(resp["panel"], "compose");
    assert_eq!(resp["compose"]["recipients"], "nobody@example.com");
    assert_eq!(resp["compose"]["body"], "Anyone?");
    assert_eq!(
        notice_texts(&resp, "error"),
        vec!["User with email nobody@example.com does not exist."]
    );
}

#[test]
fn test_send_reaching_login_page_is_an_error() {
    let mut h = CliHarness::start_with(MockMailServer::start_login_page_on_send(), "");
    h.send(json!({"command": "compose"}));
    let resp = h.send(json!({
        "command": "send",
        "recipients": "alice@example.com",
        "subject": "Hello",
        "body": "Hi"
    }));

    assert_eq!(resp["panel"], "compose");
    assert_eq!(resp["compose"]["recipients"], "alice@example.com");
    assert!(notice_texts(&resp, "success").is_empty());
    let errors = notice_texts(&resp, "error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Unexpected send response"));
}

#[test]
fn test_after_send_shows_sent_mailbox() {
    let mut h = CliHarness::start_with(MockMailServer::start(), "after_send = \"sent\"");
    h.send(json!({"command": "compose"}));
    let resp = h.send(json!({
        "command": "send",
        "recipients": "alice@example.com",
        "subject": "Status",
        "body": "All good"
    }));

    assert_eq!(resp["panel"], "mailbox");
    assert_eq!(resp["mailbox"]["name"], "sent");
    assert_eq!(row_ids(&resp), vec![3, 5]);
    assert_eq!(
        notice_texts(&resp, "success"),
        vec!["Email sent successfully."]
    );
}

#[test]
fn test_failed_mailbox_falls_back_to_inbox() {
    let mut h = CliHarness::start_with(MockMailServer::start_failing("sent"), "");
    let resp = h.send(json!({"command": "load_mailbox", "mailbox": "sent"}));

    assert_eq!(resp["panel"], "mailbox");
    assert_eq!(resp["mailbox"]["name"], "inbox");
    assert_eq!(row_ids(&resp), vec![1, 2]);
    assert_eq!(notice_texts(&resp, "error"), vec!["Invalid mailbox."]);
}

#[test]
fn test_failed_inbox_does_not_retry_forever() {
    let mut h = CliHarness::start_with(MockMailServer::start_failing("inbox"), "");
    let resp = h.send(json!({"command": "status"}));

    assert_eq!(resp["panel"], "mailbox");
    assert!(row_ids(&resp).is_empty());
    // The first load and a single fallback.
    assert_eq!(h.server.requests_matching("GET", "/emails/inbox").len(), 2);
}

#[test]
fn test_unknown_command() {
    let mut h = CliHarness::start();
    let resp = h.send(json!({"command": "frobnicate"}));
    assert_eq!(resp["ok"], false);
    assert!(resp["error"].as_str().unwrap().contains("frobnicate"));
}
