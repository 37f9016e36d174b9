//! Minimal HTTP/1.1 server emulating the remote index for integration tests.
//!
//! Serves `tags.json` (count query), `posts.json` (paged post records),
//! `users.json` (login check), and asset bytes under `/assets/`. Failure
//! injection covers the retry paths: respond with a 500, or accept and
//! close without writing a byte (curl reports a transport error).

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Page stride the server assumes when slicing the post stream: page `p`
/// starts at `(p - 1) * PAGE_STRIDE` regardless of the advertised limit,
/// matching a remote whose page index advances over the result stream.
pub const PAGE_STRIDE: u64 = 200;

struct ServerState {
    posts: Mutex<Vec<serde_json::Value>>,
    post_count: AtomicU64,
    tags_body: Mutex<Option<String>>,
    fail_statuses: AtomicU32,
    drop_conns: AtomicU32,
    auth_ok: AtomicBool,
    requests: Mutex<Vec<String>>,
}

/// Handle to a running test server. The server lives until the process
/// exits; tests just stop talking to it.
pub struct BooruServer {
    pub base_url: String,
    state: Arc<ServerState>,
}

/// Starts a server with the given post records; the reported tag count
/// defaults to the number of posts.
pub fn start(posts: Vec<serde_json::Value>) -> BooruServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(ServerState {
        post_count: AtomicU64::new(posts.len() as u64),
        posts: Mutex::new(posts),
        tags_body: Mutex::new(None),
        fail_statuses: AtomicU32::new(0),
        drop_conns: AtomicU32::new(0),
        auth_ok: AtomicBool::new(true),
        requests: Mutex::new(Vec::new()),
    });
    let thread_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&thread_state);
            thread::spawn(move || handle(stream, &state));
        }
    });
    BooruServer {
        base_url: format!("http://127.0.0.1:{port}"),
        state,
    }
}

impl BooruServer {
    /// Respond to the next `n` posts requests with HTTP 500.
    pub fn fail_next_statuses(&self, n: u32) {
        self.state.fail_statuses.store(n, Ordering::SeqCst);
    }

    /// Close the next `n` posts connections without writing a response.
    pub fn drop_next_connections(&self, n: u32) {
        self.state.drop_conns.store(n, Ordering::SeqCst);
    }

    pub fn set_auth_ok(&self, ok: bool) {
        self.state.auth_ok.store(ok, Ordering::SeqCst);
    }

    pub fn set_post_count(&self, n: u64) {
        self.state.post_count.store(n, Ordering::SeqCst);
    }

    /// Overrides the tags.json response body (for shape-mismatch tests).
    pub fn set_tags_body(&self, body: &str) {
        *self.state.tags_body.lock().unwrap() = Some(body.to_string());
    }

    /// Replaces the post stream; the reported tag count follows.
    pub fn set_posts(&self, posts: Vec<serde_json::Value>) {
        self.state
            .post_count
            .store(posts.len() as u64, Ordering::SeqCst);
        *self.state.posts.lock().unwrap() = posts;
    }

    /// Raw request targets (path?query) seen so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Targets of posts queries only.
    pub fn posts_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|t| t.starts_with("/posts.json"))
            .collect()
    }
}

fn handle(mut stream: TcpStream, state: &ServerState) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let Some(target) = request.split_whitespace().nth(1) else {
        return;
    };
    state.requests.lock().unwrap().push(target.to_string());

    if target.starts_with("/tags.json") {
        let body = match state.tags_body.lock().unwrap().clone() {
            Some(body) => body,
            None => {
                let count = state.post_count.load(Ordering::SeqCst);
                format!(r#"[{{"name":"test","post_count":{count}}}]"#)
            }
        };
        return respond(&mut stream, "200 OK", body.as_bytes());
    }

    if target.starts_with("/users.json") {
        if state.auth_ok.load(Ordering::SeqCst) {
            return respond(&mut stream, "200 OK", b"[]");
        }
        return respond(&mut stream, "401 Unauthorized", b"");
    }

    if target.starts_with("/posts.json") {
        if take_one(&state.drop_conns) {
            return; // close without a response
        }
        if take_one(&state.fail_statuses) {
            return respond(&mut stream, "500 Internal Server Error", b"");
        }
        let page = query_param(target, "page").unwrap_or(1).max(1);
        let limit = query_param(target, "limit").unwrap_or(PAGE_STRIDE);
        let posts = state.posts.lock().unwrap();
        let start = (((page - 1) * PAGE_STRIDE) as usize).min(posts.len());
        let end = (start + limit as usize).min(posts.len());
        let body = serde_json::to_vec(&posts[start..end]).unwrap();
        return respond(&mut stream, "200 OK", &body);
    }

    if target.starts_with("/assets/") {
        let body = format!("asset:{target}");
        return respond(&mut stream, "200 OK", body.as_bytes());
    }

    respond(&mut stream, "404 Not Found", b"");
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn query_param(target: &str, name: &str) -> Option<u64> {
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
        .and_then(|v| v.parse().ok())
}

fn respond(stream: &mut TcpStream, status: &str, body: &[u8]) {
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}
