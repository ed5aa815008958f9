use crate::config::Credentials;
use crate::traits::Mailbox;
use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use async_trait::async_trait;
use futures::{StreamExt, pin_mut};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

type ImapSession = Session<TlsStream<Compat<TcpStream>>>;

/// A read-only IMAP session over implicit TLS
pub struct ImapMailbox {
    session: ImapSession,
}

impl ImapMailbox {
    /// Connects, logs in and EXAMINEs `folder`, so no flags are ever changed.
    pub async fn open(creds: &Credentials, folder: &str) -> anyhow::Result<Self> {
        let mut session = Self::connect(creds).await?;

        if let Err(e) = session.examine(folder).await {
            if let Err(logout_err) = session.logout().await {
                warn!("Logout after failed select also failed: {}", logout_err);
            }
            return Err(anyhow::anyhow!("Failed to select mailbox {}: {}", folder, e));
        }

        info!("Selected {} read-only on {}", folder, creds.host);
        Ok(Self { session })
    }

    async fn connect(creds: &Credentials) -> anyhow::Result<ImapSession> {
        let addr = format!("{}:{}", creds.host, creds.port);
        let tcp_stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", addr, e))?;

        let tls = TlsConnector::new();
        let tls_stream = tls
            .connect(&creds.host, tcp_stream.compat())
            .await
            .map_err(|e| anyhow::anyhow!("TLS connection failed: {}", e))?;

        let client = async_imap::Client::new(tls_stream);

        let session = client
            .login(&creds.username, &creds.password)
            .await
            .map_err(|e| anyhow::anyhow!("Login failed: {}", e.0))?;

        debug!("Logged in to {} as {}", addr, creds.username);
        Ok(session)
    }
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn search_all(&mut self) -> anyhow::Result<Vec<u32>> {
        let uids = self
            .session
            .uid_search("ALL")
            .await
            .map_err(|e| anyhow::anyhow!("Search failed: {}", e))?;

        // The server answers with a set; ascending UIDs are roughly arrival order
        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();

        debug!("Mailbox holds {} messages", uids.len());
        Ok(uids)
    }

    async fn fetch_raw(&mut self, uid: u32) -> anyhow::Result<Option<Vec<u8>>> {
        let fetch_stream = self
            .session
            .uid_fetch(uid.to_string(), "BODY.PEEK[]")
            .await
            .map_err(|e| anyhow::anyhow!("Fetch failed: {}", e))?;
        pin_mut!(fetch_stream);

        let mut raw = None;
        while let Some(fetch_result) = fetch_stream.next().await {
            let message =
                fetch_result.map_err(|e| anyhow::anyhow!("Error reading fetch result: {}", e))?;

            // Keep draining so the session is ready for the next command
            if raw.is_none() {
                raw = message.body().map(|body| body.to_vec());
            }
        }

        Ok(raw)
    }

    async fn logout(&mut self) -> anyhow::Result<()> {
        self.session
            .logout()
            .await
            .map_err(|e| anyhow::anyhow!("Logout failed: {}", e))
    }
}
