use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::domain::ports::SyncMode;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "site-organizer")]
#[command(about = "Organize saved sites into ordered categories")]
pub struct CliConfig {
    /// Base URL of the bookmark backend
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// How persistence plans from separate gestures are issued
    #[arg(long, value_enum)]
    pub sync_mode: Option<SyncMode>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show categories and their sites in display order
    List,
    /// Drop SOURCE onto TARGET, e.g. `drag site-3 category-2`
    Drag {
        source: String,
        target: Option<String>,
        /// Show the resulting order and backend calls without sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the URLs of every site in a category, in display order
    Open {
        category_id: i64,
    },
    AddCategory {
        name: String,
    },
    AddSite {
        category_id: i64,
        title: String,
        url: String,
    },
    RenameCategory {
        id: i64,
        name: String,
    },
    RenameSite {
        id: i64,
        title: String,
    },
    DeleteCategory {
        id: i64,
    },
    DeleteSite {
        id: i64,
    },
}

impl CliConfig {
    /// 讀取 TOML（若有指定），再以命令列參數覆蓋
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                let file_config = TomlConfig::from_file(path)?;
                file_config.validate()?;
                Settings::from(&file_config)
            }
            None => Settings::default(),
        };

        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = Some(timeout);
        }
        if let Some(mode) = self.sync_mode {
            settings.sync_mode = mode;
        }
        settings.verbose |= self.verbose;
        settings.json_logs |= self.json_logs;

        settings.validate()?;
        Ok(settings)
    }
}
