use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bazaar_core::{BazaarError, MessageWriter, Result, TaskToken, User};
use bazaar_scheduler::{MemoryTaskStore, Notifier};
use uuid::Uuid;

use crate::context::{AccountsContext, AccountsExecutor, build_executor};
use crate::hasher::Argon2Hasher;
use crate::repo::{MemoryGoodRepo, MemoryUserRepo};

#[derive(Debug, Clone)]
pub struct Sent {
    pub text: String,
    pub address: String,
    pub eta: Option<Duration>,
}

pub struct MockWriter {
    name: &'static str,
    sent: Mutex<Vec<Sent>>,
    failing: AtomicBool,
}

impl MockWriter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            sent: Mutex::default(),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every following send fail with a channel error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn push(&self, text: &str, address: &str, eta: Option<Duration>) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BazaarError::Channel(format!("{} is down", self.name)));
        }
        self.sent.lock().unwrap().push(Sent {
            text: text.into(),
            address: address.into(),
            eta,
        });
        Ok(())
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Token from the most recent confirmation link.
    pub fn last_token(&self) -> TaskToken {
        let sent = self.sent();
        let text = &sent.last().expect("nothing sent").text;
        let (_, token) = text.rsplit_once("/confirm/").expect("no confirmation link");
        token.parse().unwrap()
    }
}

#[async_trait]
impl MessageWriter for MockWriter {
    fn name(&self) -> &str {
        self.name
    }

    async fn send_now(&self, text: &str, address: &str) -> Result<()> {
        self.push(text, address, None)
    }

    async fn send_later(&self, text: &str, address: &str, eta: Duration) -> Result<()> {
        self.push(text, address, Some(eta))
    }
}

pub struct Harness {
    pub ctx: Arc<AccountsContext>,
    pub executor: Arc<AccountsExecutor>,
    pub goods: Arc<MemoryGoodRepo>,
    pub mail: Arc<MockWriter>,
    pub telegram: Arc<MockWriter>,
}

impl Harness {
    pub fn new() -> Self {
        let executor = build_executor(Arc::new(MemoryTaskStore::new())).unwrap();
        let mail = Arc::new(MockWriter::new("email"));
        let telegram = Arc::new(MockWriter::new("telegram"));
        let goods = Arc::new(MemoryGoodRepo::new());
        let ctx = Arc::new(AccountsContext {
            users: Arc::new(MemoryUserRepo::new()),
            goods: goods.clone(),
            hasher: Arc::new(Argon2Hasher),
            mail: Some(Notifier::new(mail.clone(), executor.clone(), "https://bazaar.example")),
            telegram: Some(Notifier::new(telegram.clone(), executor.clone(), "https://bazaar.example")),
        });
        Self { ctx, executor, goods, mail, telegram }
    }

    pub fn user(name: &str, email: Option<&str>, telegram: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.into(),
            hashed_password: String::new(),
            active: false,
            active_time: None,
            email: email.map(Into::into),
            telegram: telegram.map(Into::into),
        }
    }

    /// An active user whose password is "secret".
    pub async fn insert_user(&self, name: &str, email: Option<&str>, telegram: Option<&str>) -> User {
        let mut user = Self::user(name, email, telegram);
        user.hashed_password = self.ctx.hasher.hash("secret").unwrap();
        let user = self.ctx.users.add_nonactive(user).await.unwrap();
        self.ctx.users.activate(user.id).await.unwrap()
    }

    pub async fn follow(&self, token: &TaskToken) -> Result<bazaar_core::ActionKind> {
        self.executor.dispatch(token, &self.ctx).await
    }
}
