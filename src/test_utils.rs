// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for the Kubernetes API server.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use crate::error::StudioError;
use crate::tunnel::{PodConnector, Upstream, UpstreamStream};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::net::{TcpListener, TcpStream};
use tower::Service;

/// Resource collections the fake server knows how to list
const COLLECTIONS: &[&str] = &["namespaces", "services", "pods", "deployments"];

/// A fake API server that stores objects by path.
///
/// GET returns the stored object or a list of a collection's members, POST to a
/// collection creates a member (409 when it exists), PUT replaces a member.
/// Responses registered with `on_get`/`on_post` take precedence.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    objects: Arc<Mutex<BTreeMap<String, Value>>>,
    overrides: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object at the exact path
    pub fn with_object(self, path: &str, object: Value) -> Self {
        self.set_object(path, object);
        self
    }

    /// Add a fixed response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .insert(("GET".to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a fixed response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .insert(("POST".to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    pub fn set_object(&self, path: &str, object: Value) {
        self.objects.lock().unwrap().insert(path.to_string(), object);
    }

    pub fn object(&self, path: &str) -> Option<Value> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    /// Every (method, path) received so far, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }

    /// Build a kube Client backed by this server
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    fn handle(&self, method: &str, path: &str, query: Option<&str>, body: &[u8]) -> (u16, String) {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), path.to_string()));

        if let Some(resp) = self
            .overrides
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
        {
            return resp.clone();
        }

        match method {
            "GET" if is_collection(path) => (200, self.list(path, query)),
            "GET" => match self.object(path) {
                Some(obj) => (200, obj.to_string()),
                None => (404, not_found_json(collection_of(path), last_segment(path))),
            },
            "POST" => self.create(path, body),
            "PUT" => self.replace(path, body),
            _ => (405, status_json(405, "MethodNotAllowed", "method not allowed")),
        }
    }

    fn list(&self, path: &str, query: Option<&str>) -> String {
        let selector = query
            .into_iter()
            .flat_map(|q| url::form_urlencoded::parse(q.as_bytes()))
            .find(|(k, _)| k == "labelSelector")
            .map(|(_, v)| parse_selector(&v))
            .unwrap_or_default();

        let prefix = format!("{}/", path);
        let items: Vec<Value> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')))
            .map(|(_, obj)| obj.clone())
            .filter(|obj| matches_selector(obj, &selector))
            .collect();

        serde_json::json!({
            "apiVersion": "v1",
            "kind": "List",
            "metadata": { "resourceVersion": "1" },
            "items": items
        })
        .to_string()
    }

    fn create(&self, path: &str, body: &[u8]) -> (u16, String) {
        let Ok(mut obj) = serde_json::from_slice::<Value>(body) else {
            return (400, status_json(400, "BadRequest", "invalid body"));
        };
        let Some(name) = obj["metadata"]["name"].as_str().map(str::to_string) else {
            return (422, status_json(422, "Invalid", "name is required"));
        };

        let object_path = format!("{}/{}", path, name);
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&object_path) {
            let message = format!("{} \"{}\" already exists", collection_of(&object_path), name);
            return (409, status_json(409, "AlreadyExists", &message));
        }

        obj["metadata"]["uid"] = Value::from(format!("uid-{}", name));
        obj["metadata"]["resourceVersion"] = Value::from("1");
        objects.insert(object_path, obj.clone());
        (201, obj.to_string())
    }

    fn replace(&self, path: &str, body: &[u8]) -> (u16, String) {
        let Ok(obj) = serde_json::from_slice::<Value>(body) else {
            return (400, status_json(400, "BadRequest", "invalid body"));
        };

        let mut objects = self.objects.lock().unwrap();
        if !objects.contains_key(path) {
            return (404, not_found_json(collection_of(path), last_segment(path)));
        }
        objects.insert(path.to_string(), obj.clone());
        (200, obj.to_string())
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let query = req.uri().query().map(str::to_string);
            let body = req.into_body().collect().await?.to_bytes();

            let (status, body) = server.handle(&method, &path, query.as_deref(), &body);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

fn is_collection(path: &str) -> bool {
    COLLECTIONS.contains(&last_segment(path))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

fn collection_of(path: &str) -> &str {
    path.rsplit('/').nth(1).unwrap_or_default()
}

fn parse_selector(selector: &str) -> BTreeMap<String, String> {
    selector
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn matches_selector(obj: &Value, selector: &BTreeMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(k, v)| obj["metadata"]["labels"][k].as_str() == Some(v.as_str()))
}

fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a mock namespace JSON object
pub fn namespace_json(name: &str) -> Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
}

/// Create a mock pod JSON object with the given phase
pub fn pod_json(namespace: &str, name: &str, labels: Value, phase: &str) -> Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": labels
        },
        "status": {
            "phase": phase
        }
    })
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Start a TCP server on an ephemeral port that echoes every connection back
pub async fn start_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut conn, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let (mut rd, mut wr) = conn.split();
                let _ = tokio::io::copy(&mut rd, &mut wr).await;
            });
        }
    });
    addr
}

/// Upstream that connects to a local echo server, counting the streams it opens
pub struct EchoUpstream {
    addr: SocketAddr,
    opened: Arc<AtomicUsize>,
}

impl EchoUpstream {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Upstream for EchoUpstream {
    fn open(&self) -> BoxFuture<'_, crate::error::Result<UpstreamStream>> {
        async move {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let stream = TcpStream::connect(self.addr)
                .await
                .map_err(|e| StudioError::TunnelTransportError(e.to_string()))?;
            Ok(UpstreamStream {
                stream: Box::new(stream),
                done: futures::future::ready(Ok(())).boxed(),
            })
        }
        .boxed()
    }
}

/// Connector that hands out echo upstreams and records which pods were asked for
#[derive(Clone)]
pub struct EchoConnector {
    addr: SocketAddr,
    pods: Arc<Mutex<Vec<(String, u16)>>>,
}

impl EchoConnector {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            pods: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn connected(&self) -> Vec<(String, u16)> {
        self.pods.lock().unwrap().clone()
    }
}

impl PodConnector for EchoConnector {
    type Upstream = EchoUpstream;

    fn connect(&self, pod_name: &str, port: u16) -> EchoUpstream {
        self.pods.lock().unwrap().push((pod_name.to_string(), port));
        EchoUpstream::new(self.addr)
    }
}
