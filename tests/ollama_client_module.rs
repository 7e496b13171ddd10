use duet::ollama::{ChatCompletion, OllamaClient, OllamaError, PromptMessage};
use duet::shared::ChatRole;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::thread;

struct Recorded {
    method: String,
    path: String,
    body: serde_json::Value,
}

struct MockResponse {
    status_line: &'static str,
    content_type: &'static str,
    body: String,
}

impl MockResponse {
    fn json(body: &str) -> Self {
        Self {
            status_line: "200 OK",
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    fn ndjson(lines: &[&str]) -> Self {
        Self {
            status_line: "200 OK",
            content_type: "application/x-ndjson",
            body: lines
                .iter()
                .map(|line| format!("{line}\n"))
                .collect::<String>(),
        }
    }

    fn status(status_line: &'static str, body: &str) -> Self {
        Self {
            status_line,
            content_type: "application/json",
            body: body.to_string(),
        }
    }
}

fn spawn_model_server(responses: Vec<MockResponse>) -> (String, Receiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        for response in responses {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

            let mut request_line = String::new();
            reader
                .read_line(&mut request_line)
                .expect("read request line");
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let path = parts.next().unwrap_or_default().to_string();

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header line");
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().expect("content length");
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).expect("read body");
            let body = if body.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&body).expect("json body")
            };
            let _ = sender.send(Recorded { method, path, body });

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response.status_line,
                response.content_type,
                response.body.len(),
                response.body
            );
            stream.write_all(reply.as_bytes()).expect("write response");
        }
    });

    (format!("http://{addr}"), receiver)
}

fn conversation_prompt() -> Vec<PromptMessage> {
    vec![
        PromptMessage::new(ChatRole::System, "be terse"),
        PromptMessage::new(ChatRole::User, "hello"),
    ]
}

#[test]
fn list_models_reads_tags() {
    let (host, requests) = spawn_model_server(vec![MockResponse::json(
        r#"{"models":[{"name":"llama3:latest","model":"llama3:latest","size":4661224676,"digest":"abc","modified_at":"2024-05-01T10:00:00Z"},{"name":"phi3:mini","model":"","size":1}]}"#,
    )]);
    let client = OllamaClient::new(format!("{host}/"));
    let models = client.list_models().expect("models");

    let names = models
        .iter()
        .map(|model| model.identifier())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["llama3:latest", "phi3:mini"]);

    let request = requests.recv().expect("request");
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/api/tags");
}

#[test]
fn show_model_posts_name_and_returns_raw_metadata() {
    let (host, requests) = spawn_model_server(vec![MockResponse::json(
        r#"{"modelfile":"FROM llama3","details":{"family":"llama","parameter_size":"8B"}}"#,
    )]);
    let details = OllamaClient::new(host).show_model("llama3").expect("show");
    assert_eq!(details["details"]["family"], "llama");

    let request = requests.recv().expect("request");
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/show");
    assert_eq!(request.body["model"], "llama3");
}

#[test]
fn streamed_chat_yields_fragments_in_order() {
    let (host, requests) = spawn_model_server(vec![MockResponse::ndjson(&[
        r#"{"model":"m1","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        r#"{"model":"m1","message":{"role":"assistant","content":" there"},"done":false}"#,
        r#"{"model":"m1","message":{"role":"assistant","content":""},"done":true,"total_duration":1}"#,
    ])]);
    let client = OllamaClient::new(host);
    let fragments = client
        .stream_chat("m1", &conversation_prompt())
        .expect("stream")
        .collect::<Result<Vec<_>, _>>()
        .expect("fragments");
    assert_eq!(fragments.concat(), "Hi there");

    let request = requests.recv().expect("request");
    assert_eq!(request.path, "/api/chat");
    assert_eq!(request.body["model"], "m1");
    assert_eq!(request.body["stream"], true);
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(request.body["messages"][1]["content"], "hello");
}

#[test]
fn streamed_chat_surfaces_server_errors() {
    let (host, _requests) = spawn_model_server(vec![MockResponse::ndjson(&[
        r#"{"message":{"role":"assistant","content":"par"},"done":false}"#,
        r#"{"error":"model runner has unexpectedly stopped"}"#,
    ])]);
    let client = OllamaClient::new(host);
    let results = client
        .stream_chat("m1", &conversation_prompt())
        .expect("stream")
        .collect::<Vec<_>>();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().expect("fragment"), "par");
    match &results[1] {
        Err(OllamaError::Server(message)) => {
            assert_eq!(message, "model runner has unexpectedly stopped")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn complete_chat_requests_a_single_response() {
    let (host, requests) = spawn_model_server(vec![MockResponse::json(
        r#"{"model":"m1","message":{"role":"assistant","content":"Rust Ownership"},"done":true}"#,
    )]);
    let reply = OllamaClient::new(host)
        .complete_chat("m1", &conversation_prompt())
        .expect("reply");
    assert_eq!(reply, "Rust Ownership");
    assert_eq!(requests.recv().expect("request").body["stream"], false);
}

#[test]
fn pull_reports_status_and_byte_progress() {
    let (host, requests) = spawn_model_server(vec![MockResponse::ndjson(&[
        r#"{"status":"pulling manifest"}"#,
        r#"{"status":"pulling 6a0746a1ec1a","digest":"sha256:6a07","total":2000,"completed":500}"#,
        r#"{"status":"success"}"#,
    ])]);
    let events = OllamaClient::new(host)
        .pull_model("m1")
        .expect("pull")
        .collect::<Result<Vec<_>, _>>()
        .expect("events");

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].completed, None);
    assert_eq!(events[1].total, Some(2000));
    assert_eq!(events[1].completed, Some(500));
    assert_eq!(events[1].digest.as_deref(), Some("sha256:6a07"));
    assert!(events[2].is_success());

    let request = requests.recv().expect("request");
    assert_eq!(request.path, "/api/pull");
    assert_eq!(request.body["stream"], true);
}

#[test]
fn deleting_an_unknown_model_reports_status() {
    let (host, requests) = spawn_model_server(vec![MockResponse::status(
        "404 Not Found",
        r#"{"error":"model 'ghost' not found"}"#,
    )]);
    let err = OllamaClient::new(host)
        .delete_model("ghost")
        .expect_err("missing model");
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("model 'ghost' not found"));

    let request = requests.recv().expect("request");
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.path, "/api/delete");
    assert_eq!(request.body["model"], "ghost");
}

#[test]
fn unreachable_server_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = OllamaClient::new(format!("http://{addr}"))
        .list_models()
        .expect_err("connection refused");
    assert!(matches!(err, OllamaError::Request { .. }), "{err:?}");
}
