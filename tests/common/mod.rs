//! Shared mocks for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use token_giveaway::blockchain::{Ledger, LedgerError, LedgerResult, TokenAccount, TxSignature};
use token_giveaway::selection::WalletAddress;
use token_giveaway::social::{Comment, CommentSource, Notifier, SocialError, SocialResult};
use token_giveaway::{GiveawayConfig, GiveawayContext};

pub const ADDR1: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
pub const ADDR2: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const ADDR3: &str = "HN7cABqLq46Es1jh92dQQisAq662SmxELLLsHHe4YWrH";
pub const ADDR4: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

pub fn addr(s: &str) -> WalletAddress {
    s.parse().unwrap()
}

pub fn comment(author: &str, text: &str, secs: i64, id: &str) -> Comment {
    Comment::new(author, text, Utc.timestamp_opt(secs, 0).unwrap(), id)
}

pub fn test_config() -> GiveawayConfig {
    let mut config = GiveawayConfig::default();
    config.giveaway.video_id = "7301".into();
    config
}

pub fn test_context() -> GiveawayContext {
    GiveawayContext::new(test_config()).unwrap()
}

/// Ledger with scripted failures and call counters.
#[derive(Default)]
pub struct MockLedger {
    pub find_calls: AtomicU32,
    pub create_calls: AtomicU32,
    pub transfer_calls: AtomicU32,
    /// Upcoming transfers that fail before one succeeds.
    fail_next: AtomicU32,
    /// Owners whose transfers always fail.
    broken_owners: Mutex<HashSet<String>>,
    /// Owners with a token account created during the test.
    created: Mutex<HashSet<String>>,
    accounts_exist: bool,
    transfer_delay: Duration,
}

impl MockLedger {
    /// Every recipient already holds a token account.
    pub fn healthy() -> Self {
        Self {
            accounts_exist: true,
            ..Self::default()
        }
    }

    /// Recipients start without token accounts.
    pub fn without_accounts() -> Self {
        Self::default()
    }

    pub fn failing(self, transfers: u32) -> Self {
        self.fail_next.store(transfers, Ordering::SeqCst);
        self
    }

    pub fn with_broken_owner(self, owner: &str) -> Self {
        self.broken_owners.lock().unwrap().insert(owner.to_string());
        self
    }

    pub fn with_transfer_delay(mut self, delay: Duration) -> Self {
        self.transfer_delay = delay;
        self
    }

    pub fn transfers(&self) -> u32 {
        self.transfer_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }
}

fn account_of(owner: &str) -> TokenAccount {
    TokenAccount(format!("ata-{}", owner))
}

#[async_trait]
impl Ledger for MockLedger {
    async fn find_token_account(&self, owner: &WalletAddress) -> LedgerResult<Option<TokenAccount>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let exists = self.accounts_exist || self.created.lock().unwrap().contains(owner.as_str());
        Ok(exists.then(|| account_of(owner.as_str())))
    }

    async fn create_token_account(&self, owner: &WalletAddress) -> LedgerResult<TokenAccount> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().insert(owner.to_string());
        Ok(account_of(owner.as_str()))
    }

    async fn transfer(&self, destination: &TokenAccount, _amount: u64) -> LedgerResult<TxSignature> {
        let n = self.transfer_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.transfer_delay.is_zero() {
            tokio::time::sleep(self.transfer_delay).await;
        }

        let owner = destination.as_str().trim_start_matches("ata-");
        if self.broken_owners.lock().unwrap().contains(owner) {
            return Err(LedgerError::Rpc(format!("account {} frozen", owner)));
        }
        let scripted_failure = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(LedgerError::Timeout(60));
        }
        Ok(TxSignature(format!("sig-{}-{}", n, owner)))
    }
}

/// Comment source returning a fixed batch, or failing.
pub struct MockSource {
    comments: Option<Vec<Comment>>,
}

impl MockSource {
    pub fn with(comments: Vec<Comment>) -> Arc<Self> {
        Arc::new(Self {
            comments: Some(comments),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self { comments: None })
    }
}

#[async_trait]
impl CommentSource for MockSource {
    async fn fetch_comments(&self, _video_id: &str) -> SocialResult<Vec<Comment>> {
        match &self.comments {
            Some(comments) => Ok(comments.clone()),
            None => Err(SocialError::Status {
                status: 503,
                body: "Service Unavailable".into(),
            }),
        }
    }
}

/// Notifier that records every reply it is asked to send.
#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, comment_id: &str, message: &str) -> SocialResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((comment_id.to_string(), message.to_string()));
        if self.fail {
            return Err(SocialError::Status {
                status: 500,
                body: "reply failed".into(),
            });
        }
        Ok(())
    }
}

/// Read one request, head and body, as text.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// The handler receives the raw request and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;

                let (status, body) = f(request).await;
                let status_text = match status {
                    200 => "200 OK",
                    401 => "401 Unauthorized",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
