//! # Common Test Utilities
//!
//! In-memory identity service, settings and request helpers shared by the
//! integration tests.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
        Once,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use keystone::{AccessInfo, Credentials, IdentityError, IdentityService, Role, Tenant, Token, UserRef};
use server::{
    session::{SessionState, TokenPair, SESSION_STATE_KEY},
    settings::{AuthSettings, AvailableRegions, Region},
    AppState,
};
use tower::ServiceExt;
use tower_sessions::{
    session::{Id, Record},
    session_store,
    MemoryStore,
    SessionStore,
};

pub const HOST: &str = "myapp.example";
pub const R1: &str = "http://r1.example:5000/v2.0";
pub const R2: &str = "http://r2.example:5000/v2.0";
pub const CAS_USER: &str = "casuser";
pub const VALID_TICKET: &str = "ST-valid";

/// Initialize test logging (run once per test session)
static INIT: Once = Once::new();

pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Identity service double that issues tokens from a counter.
#[derive(Default)]
pub struct MockIdentity {
    passwords:              HashMap<String, String>,
    pub tenants:            Vec<Tenant>,
    /// Auth URLs that answer every call with a transport error.
    pub unreachable:        HashSet<String>,
    /// Tenant ids scoping is refused for.
    pub forbidden_tenants:  HashSet<String>,
    /// Token ids whose deletion fails.
    pub undeletable:        HashSet<String>,
    pub delete_delay:       Option<Duration>,
    counter:                AtomicUsize,
    owners:                 Mutex<HashMap<String, String>>,
    pub deleted:            Mutex<Vec<TokenPair>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        let mut passwords = HashMap::new();
        passwords.insert("admin".to_string(), "secret".to_string());
        passwords.insert("demo".to_string(), "demo-pass".to_string());
        Self {
            passwords,
            tenants: vec![
                tenant("t-disabled", false),
                tenant("t-1", true),
                tenant("t-2", true),
            ],
            ..Self::default()
        }
    }

    pub fn deleted(&self) -> Vec<TokenPair> { self.deleted.lock().unwrap().clone() }

    fn issue(&self, kind: &str, username: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}-{}", kind, n);
        self.owners
            .lock()
            .unwrap()
            .insert(id.clone(), username.to_string());
        id
    }

    fn owner(&self, token_id: &str) -> Option<String> { self.owners.lock().unwrap().get(token_id).cloned() }

    fn check_reachable(&self, auth_url: &str) -> Result<(), IdentityError> {
        if self.unreachable.contains(auth_url) {
            return Err(IdentityError::Transport {
                operation: "authenticate",
                message:   "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

pub fn tenant(id: &str, enabled: bool) -> Tenant {
    Tenant {
        id: id.to_string(),
        name: format!("project {}", id),
        enabled,
        description: None,
    }
}

fn rejected(operation: &'static str) -> IdentityError {
    IdentityError::Status {
        operation,
        status: 401,
        message: "The request you have made requires authentication.".to_string(),
    }
}

fn access(token_id: String, username: &str, tenant: Option<Tenant>) -> AccessInfo {
    AccessInfo {
        token:           Token {
            id: token_id,
            expires: None,
            tenant,
        },
        user:            UserRef {
            id:    format!("id-{}", username),
            name:  username.to_string(),
            roles: vec![Role {
                name: "member".to_string(),
            }],
        },
        service_catalog: vec![],
    }
}

#[async_trait]
impl IdentityService for MockIdentity {
    async fn authenticate(
        &self,
        auth_url: &str,
        credentials: &Credentials,
        tenant_id: Option<&str>,
    ) -> Result<AccessInfo, IdentityError> {
        self.check_reachable(auth_url)?;
        let username = match credentials {
            Credentials::Password {
                username,
                password,
            } => {
                use secrecy::ExposeSecret;
                match self.passwords.get(username) {
                    Some(expected) if expected == password.expose_secret() => username.clone(),
                    _ => return Err(rejected("authenticate")),
                }
            },
            Credentials::Token {
                id,
            } => self.owner(id).ok_or_else(|| rejected("authenticate"))?,
        };

        match tenant_id {
            Some(tenant_id) if self.forbidden_tenants.contains(tenant_id) => {
                Err(IdentityError::Status {
                    operation: "authenticate",
                    status:    403,
                    message:   "Not authorized for tenant".to_string(),
                })
            },
            Some(tenant_id) => {
                let id = self.issue("scoped", &username);
                Ok(access(id, &username, Some(tenant(tenant_id, true))))
            },
            None => {
                let id = self.issue("unscoped", &username);
                Ok(access(id, &username, None))
            },
        }
    }

    async fn list_tenants(&self, auth_url: &str, token_id: &str) -> Result<Vec<Tenant>, IdentityError> {
        self.check_reachable(auth_url)?;
        self.owner(token_id).ok_or_else(|| rejected("list tenants"))?;
        Ok(self.tenants.clone())
    }

    async fn delete_token(&self, endpoint: &str, token_id: &str) -> Result<(), IdentityError> {
        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }
        self.deleted
            .lock()
            .unwrap()
            .push(TokenPair::new(endpoint, token_id));
        if self.undeletable.contains(token_id) {
            return Err(IdentityError::Status {
                operation: "delete token",
                status:    404,
                message:   "Could not find token".to_string(),
            });
        }
        Ok(())
    }

    async fn cas_token(&self, auth_url: &str, ticket: &str, _service: &str) -> Result<String, IdentityError> {
        self.check_reachable(auth_url)?;
        if ticket != VALID_TICKET {
            return Err(rejected("CAS ticket exchange"));
        }
        Ok(self.issue("cas", CAS_USER))
    }

    async fn cas_login_url(&self, auth_url: &str, service: &str) -> Result<String, IdentityError> {
        self.check_reachable(auth_url)?;
        Ok(format!("https://cas.example/login?service={}", service))
    }
}

pub fn test_settings() -> AuthSettings {
    AuthSettings {
        regions: AvailableRegions::new(vec![
            Region {
                auth_url: R1.to_string(),
                name:     "RegionOne".to_string(),
            },
            Region {
                auth_url: R2.to_string(),
                name:     "RegionTwo".to_string(),
            },
        ]),
        keystone_url: R1.to_string(),
        ..AuthSettings::default()
    }
}

/// Memory store that remembers which session ids are live.
#[derive(Debug, Clone, Default)]
pub struct TestStore {
    inner: MemoryStore,
    live:  Arc<Mutex<HashSet<Id>>>,
}

impl TestStore {
    pub fn is_empty(&self) -> bool { self.live.lock().unwrap().is_empty() }
}

#[async_trait]
impl SessionStore for TestStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        self.inner.create(record).await?;
        self.live.lock().unwrap().insert(record.id);
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.inner.save(record).await?;
        self.live.lock().unwrap().insert(record.id);
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> { self.inner.load(id).await }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.inner.delete(id).await?;
        self.live.lock().unwrap().remove(id);
        Ok(())
    }
}

pub struct TestApp {
    pub router:   Router,
    pub identity: Arc<MockIdentity>,
    pub store:    TestStore,
}

impl TestApp {
    pub fn new() -> Self { Self::with(MockIdentity::new(), test_settings()) }

    pub fn with(identity: MockIdentity, settings: AuthSettings) -> Self {
        init_test_env();
        let identity = Arc::new(identity);
        let store = TestStore::default();
        let state = AppState::new(settings, identity.clone());
        Self {
            router: server::create_app_router(state, store.clone()),
            identity,
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri).header(header::HOST, HOST);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, format!("sessionid={}", cookie));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::HOST, HOST)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, format!("sessionid={}", cookie));
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// Log in as admin and return the session key.
    pub async fn login(&self) -> String {
        let response = self
            .post_form("/auth/login", "username=admin&password=secret", None)
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        session_key(&response).expect("login sets a session cookie")
    }

    /// Stored state of session `key`, if the session exists.
    pub async fn session(&self, key: &str) -> Option<SessionState> {
        let id = Id::from_str(key).ok()?;
        let record = self.store.load(&id).await.unwrap()?;
        let value = record.data.get(SESSION_STATE_KEY)?.clone();
        Some(serde_json::from_value(value).unwrap())
    }
}

/// Session key set by `response`, if any.
pub fn session_key<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix("sessionid="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
        .find(|v| !v.is_empty())
}

/// True when `response` clears the session cookie.
pub fn clears_session<B>(response: &Response<B>) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("sessionid=;") && v.contains("Max-Age=0"))
}

pub fn location<B>(response: &Response<B>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Wait until the identity service has seen `count` deletions.
pub async fn wait_for_deletions(identity: &MockIdentity, count: usize) -> Vec<TokenPair> {
    for _ in 0 .. 200 {
        let deleted = identity.deleted();
        if deleted.len() >= count {
            return deleted;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    identity.deleted()
}
