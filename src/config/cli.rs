use crate::config::toml_config::{DistanceProviderKind, MonitoringConfig, RelayConfig};
use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "label-relay")]
#[command(about = "Receives shipping label photos and books them through the web form")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "label-relay.toml")]
    pub config: String,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Override the distance backend from config
    #[arg(long, value_enum)]
    pub provider: Option<DistanceProviderKind>,

    /// Run the browser headless (true) or visible (false)
    #[arg(long)]
    pub headless: Option<bool>,

    #[arg(long, help = "Keep the browser open after submitting the form")]
    pub keep_browser_open: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Log per-stage CPU and memory usage")]
    pub monitor: bool,
}

impl CliArgs {
    pub fn config_file_exists(&self) -> bool {
        Path::new(&self.config).exists()
    }

    /// 載入設定檔（不存在時使用預設值），再套用命令列覆蓋
    /// 此時日誌尚未初始化，缺檔警告由呼叫端在初始化後輸出
    pub fn load_config(&self) -> Result<RelayConfig> {
        let mut config = if self.config_file_exists() {
            RelayConfig::from_file(&self.config)?
        } else {
            RelayConfig::default()
        };

        self.apply_overrides(&mut config);
        config.resolve_secrets();
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut RelayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(provider) = self.provider {
            config.distance.provider = provider;
        }
        if let Some(headless) = self.headless {
            config.browser.headless = headless;
        }
        if self.keep_browser_open {
            config.browser.keep_open = true;
        }
        if self.monitor || self.json_logs {
            let monitoring = config.monitoring.get_or_insert_with(MonitoringConfig::default);
            if self.monitor {
                monitoring.enabled = true;
            }
            if self.json_logs {
                monitoring.json_logs = Some(true);
            }
        }
    }
}
