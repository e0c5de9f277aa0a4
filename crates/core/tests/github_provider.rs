//! Integration tests for `GitHubProfileProvider` against a local HTTP
//! responder.
//!
//! The responder is a bare `tokio::net::TcpListener` that reads one request
//! per connection and answers from a canned table keyed by request path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use rostermail_core::enrich::{GitHubProfileProvider, MailEnricher, PublicEmailProvider};
use rostermail_core::errors::EnrichmentError;
use rostermail_core::models::{MatchResult, MemberRecord};

const TOKEN: &str = "ghp_testtoken0123456789";

// ===========================================================================
// Helpers
// ===========================================================================

#[derive(Clone)]
struct Canned {
    status: &'static str,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static str,
    delay: Option<Duration>,
}

impl Canned {
    fn json(status: &'static str, body: &'static str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
            delay: None,
        }
    }
}

struct Responder {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

async fn start(routes: Vec<(&'static str, Canned)>) -> Responder {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: Arc<HashMap<&'static str, Canned>> = Arc::new(routes.into_iter().collect());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&buf).to_string();
                let path = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                seen.lock().unwrap().push(head);

                let canned = routes
                    .get(path.as_str())
                    .cloned()
                    .unwrap_or_else(|| Canned::json("404 Not Found", r#"{"message":"Not Found"}"#));
                if let Some(delay) = canned.delay {
                    tokio::time::sleep(delay).await;
                }
                let mut response = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
                    canned.status,
                    canned.body.len()
                );
                for (name, value) in &canned.headers {
                    response.push_str(&format!("{}: {}\r\n", name, value));
                }
                response.push_str("\r\n");
                response.push_str(canned.body);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Responder {
        base_url: format!("http://{}", addr),
        requests,
    }
}

fn provider(responder: &Responder) -> GitHubProfileProvider {
    GitHubProfileProvider::new(&responder.base_url, TOKEN, Duration::from_secs(5)).unwrap()
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn test_public_email_is_returned() {
    let responder = start(vec![(
        "/users/octocat",
        Canned::json(
            "200 OK",
            r#"{"login":"octocat","id":583231,"name":"The Octocat","email":" octocat@github.com "}"#,
        ),
    )])
    .await;
    let github = provider(&responder);

    let email = github.lookup_public_email("octocat").await.unwrap();
    assert_eq!(email.as_deref(), Some("octocat@github.com"));

    let requests = responder.requests.lock().unwrap();
    let head = requests[0].to_lowercase();
    assert!(head.starts_with("get /users/octocat "));
    assert!(head.contains(&format!("authorization: bearer {}", TOKEN.to_lowercase())));
    assert!(head.contains("accept: application/vnd.github+json"));
    assert!(head.contains("user-agent: rostermail/"));
}

#[tokio::test]
async fn test_null_email_and_unknown_user_are_none() {
    let responder = start(vec![(
        "/users/private",
        Canned::json("200 OK", r#"{"login":"private","name":"Private Person","email":null}"#),
    )])
    .await;
    let github = provider(&responder);

    assert_eq!(github.lookup_public_email("private").await.unwrap(), None);
    assert_eq!(github.lookup_public_email("nobody").await.unwrap(), None);
}

#[tokio::test]
async fn test_handle_with_path_characters_is_not_requested() {
    let responder = start(vec![(
        "/orgs/acme",
        Canned::json("200 OK", r#"{"login":"acme","email":"org@example.com"}"#),
    )])
    .await;
    let github = provider(&responder);

    for handle in ["../orgs/acme", "acme?x=1", "acme#top", "a/b"] {
        assert_eq!(github.lookup_public_email(handle).await.unwrap(), None);
    }
    assert!(responder.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_statuses() {
    let responder = start(vec![
        (
            "/users/badtoken",
            Canned::json("401 Unauthorized", r#"{"message":"Bad credentials"}"#),
        ),
        (
            "/users/limited",
            Canned {
                status: "403 Forbidden",
                headers: vec![
                    ("x-ratelimit-remaining", "0"),
                    ("x-ratelimit-reset", "1735689600"),
                ],
                body: r#"{"message":"API rate limit exceeded"}"#,
                delay: None,
            },
        ),
        (
            "/users/blocked",
            Canned::json("403 Forbidden", r#"{"message":"Forbidden"}"#),
        ),
        (
            "/users/broken",
            Canned::json("500 Internal Server Error", r#"{}"#),
        ),
        ("/users/garbled", Canned::json("200 OK", "not json")),
    ])
    .await;
    let github = provider(&responder);

    assert!(matches!(
        github.lookup_public_email("badtoken").await,
        Err(EnrichmentError::Unauthorized(_))
    ));
    assert!(matches!(
        github.lookup_public_email("limited").await,
        Err(EnrichmentError::RateLimited { ref reset_at }) if reset_at == "1735689600"
    ));
    assert!(matches!(
        github.lookup_public_email("blocked").await,
        Err(EnrichmentError::Forbidden(_))
    ));
    assert!(matches!(
        github.lookup_public_email("broken").await,
        Err(EnrichmentError::Api { status: 500, .. })
    ));
    assert!(matches!(
        github.lookup_public_email("garbled").await,
        Err(EnrichmentError::Parse(_))
    ));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let responder = start(vec![(
        "/users/slow",
        Canned {
            delay: Some(Duration::from_secs(3)),
            ..Canned::json("200 OK", r#"{"login":"slow","email":"slow@example.com"}"#)
        },
    )])
    .await;
    let github =
        GitHubProfileProvider::new(&responder.base_url, TOKEN, Duration::from_millis(200)).unwrap();

    assert!(matches!(
        github.lookup_public_email("slow").await,
        Err(EnrichmentError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_rate_limit_halts_enricher() {
    let responder = start(vec![
        (
            "/users/first",
            Canned::json("429 Too Many Requests", r#"{"message":"slow down"}"#),
        ),
        (
            "/users/second",
            Canned::json("200 OK", r#"{"login":"second","email":"second@example.com"}"#),
        ),
    ])
    .await;
    let mut enricher = MailEnricher::new(provider(&responder));
    let mut results = vec![
        MatchResult::unmatched(MemberRecord::new("first", "First Person")),
        MatchResult::unmatched(MemberRecord::new("second", "Second Person")),
    ];
    enricher.enrich_all(&mut results).await;

    assert!(enricher.is_halted());
    assert!(results[1].emails.is_empty());
    assert_eq!(responder.requests.lock().unwrap().len(), 1);
}

#[test]
fn test_invalid_token_is_rejected_up_front() {
    let result =
        GitHubProfileProvider::new("http://127.0.0.1:9", "ghp_abc\nextra", Duration::from_secs(1));
    assert!(matches!(result, Err(EnrichmentError::InvalidCredential(_))));
}
