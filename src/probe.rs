use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::LoadTestConfig;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out waiting for response after {0:?}")]
    Timeout(Duration),
}

/// One authentication attempt against the target server. Implementations
/// must return within `timeout`; the attempt is never retried.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn authenticate(&self, username: &str, timeout: Duration) -> Result<String, ProbeError>;
}

/// Drives the stock FreeRADIUS `radclient` binary, one subprocess per
/// attempt, with the request attributes piped over stdin.
#[derive(Debug, Clone)]
pub struct RadclientProbe {
    binary: PathBuf,
    target: String,
    secret: String,
    password: String,
    nas_ip: Ipv4Addr,
}

impl RadclientProbe {
    pub fn new(config: &LoadTestConfig) -> Self {
        Self {
            binary: config.radclient.clone(),
            target: config.target(),
            secret: config.secret.clone(),
            password: config.password.clone(),
            nas_ip: config.nas_ip,
        }
    }

    fn request_attributes(&self, username: &str) -> String {
        format!(
            "User-Name = {username}, User-Password = {}, NAS-IP-Address = {}\n",
            self.password, self.nas_ip
        )
    }
}

#[async_trait]
impl Probe for RadclientProbe {
    async fn authenticate(&self, username: &str, timeout: Duration) -> Result<String, ProbeError> {
        let mut child = Command::new(&self.binary)
            .arg("-x")
            .arg(&self.target)
            .arg("auth")
            .arg(&self.secret)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // radclient reads attribute lines until EOF
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.request_attributes(username).as_bytes())
                .await?;
            drop(stdin);
        }

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if stdout.trim().is_empty() {
                    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
                } else {
                    Ok(stdout.into_owned())
                }
            }
            Ok(Err(err)) => Err(ProbeError::Io(err)),
            Err(_) => Err(ProbeError::Timeout(timeout)),
        }
    }
}
