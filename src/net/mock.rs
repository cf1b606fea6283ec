//! Scripted transport for tests.
//!
//! Replies are queued per (method, URL) and consumed in order. A route with
//! nothing queued answers 404. Held replies wait on a `Notify` so tests can
//! park one request and drive another through in the meantime.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tokio::sync::Notify;

use super::transport::{HttpRequest, HttpResponse, Method, Transport, TransportError};

enum Reply {
    Response(HttpResponse),
    Fail(TransportError),
}

struct Scripted {
    reply: Reply,
    gate: Option<Rc<Notify>>,
}

#[derive(Default)]
pub struct MockTransport {
    routes: RefCell<Vec<(Method, String, VecDeque<Scripted>)>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn push(&self, method: Method, url: &str, reply: Reply, gate: Option<Rc<Notify>>) {
        let mut routes = self.routes.borrow_mut();
        let entry = Scripted { reply, gate };
        if let Some((_, _, queue)) = routes.iter_mut().find(|(m, u, _)| *m == method && u.as_str() == url) {
            queue.push_back(entry);
        } else {
            routes.push((method, url.to_owned(), VecDeque::from([entry])));
        }
    }

    /// Queue a JSON reply.
    pub fn json(&self, method: Method, url: &str, status: u16, body: serde_json::Value) {
        let response = HttpResponse { status, body: body.to_string().into_bytes() };
        self.push(method, url, Reply::Response(response), None);
    }

    /// Queue a plain-text reply.
    pub fn text(&self, method: Method, url: &str, status: u16, body: &str) {
        let response = HttpResponse { status, body: body.as_bytes().to_vec() };
        self.push(method, url, Reply::Response(response), None);
    }

    /// Queue a transport failure.
    pub fn fail(&self, method: Method, url: &str, message: &str) {
        self.push(method, url, Reply::Fail(TransportError(message.to_owned())), None);
    }

    /// Queue a JSON reply that is only delivered after the returned gate is notified.
    pub fn held_json(&self, method: Method, url: &str, status: u16, body: serde_json::Value) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        let response = HttpResponse { status, body: body.to_string().into_bytes() };
        self.push(method, url, Reply::Response(response), Some(gate.clone()));
        gate
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait::async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let scripted = {
            let mut routes = self.routes.borrow_mut();
            routes
                .iter_mut()
                .find(|(m, u, _)| *m == request.method && *u == request.url)
                .and_then(|(_, _, queue)| queue.pop_front())
        };
        self.requests.borrow_mut().push(request);

        let Some(scripted) = scripted else {
            return Ok(HttpResponse { status: 404, body: Vec::new() });
        };
        if let Some(gate) = scripted.gate {
            gate.notified().await;
        }
        match scripted.reply {
            Reply::Response(response) => Ok(response),
            Reply::Fail(error) => Err(error),
        }
    }
}
