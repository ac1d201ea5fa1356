use clap::Parser;
use site_organizer::utils::error::ErrorSeverity;
use site_organizer::utils::logger;
use site_organizer::{
    CategoryId, CliConfig, Collection, Command, DropOutcome, DragRef, NewSite, Organizer,
    OrganizerError, PersistencePlan, RestBackend, SiteId,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if settings.json_logs {
        logger::init_json_logger(settings.verbose);
    } else {
        logger::init_cli_logger(settings.verbose);
    }
    tracing::debug!("Settings: {:?}", settings);

    if let Err(e) = run(cli.command, &settings).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: Command, settings: &site_organizer::Settings) -> Result<(), OrganizerError> {
    let backend = Arc::new(RestBackend::from_config(settings)?);
    let mut organizer = Organizer::connect(backend, settings.sync_mode).await?;

    match command {
        Command::List => print_collection(organizer.collection()),
        Command::Drag {
            source,
            target,
            dry_run,
        } => {
            if dry_run {
                let source: DragRef = source.parse()?;
                let target = target.as_deref().map(str::parse::<DragRef>).transpose()?;
                match organizer.preview_drop(source, target) {
                    Ok(Some(reordered)) => {
                        println!("🔍 DRY RUN - nothing is sent to the backend");
                        print_plan(&reordered.plan);
                        print_collection(&reordered.collection);
                    }
                    Ok(None) => println!("Nothing to do: the order would not change"),
                    Err(e @ OrganizerError::StaleReference { .. }) => {
                        println!("Nothing to do: {}", e.user_friendly_message())
                    }
                    Err(e) => return Err(e),
                }
            } else {
                match organizer.handle_drop(&source, target.as_deref())? {
                    DropOutcome::Applied { ticket, plan } => {
                        tracing::info!(ticket, "Waiting for backend to persist the new order");
                        print_plan(&plan);
                    }
                    DropOutcome::Ignored(reason) => println!("Nothing to do ({:?})", reason),
                }

                let report = organizer.settle().await?;
                if let Some(failure) = report.failures.first() {
                    eprintln!("⚠️ Saving the order failed; reloaded the backend state");
                    tracing::warn!("{:?}", failure);
                } else {
                    println!("✅ Order saved");
                }
                print_collection(organizer.collection());
            }
        }
        Command::Open { category_id } => {
            let urls = organizer.site_urls(CategoryId(category_id))?;
            if urls.len() > 1 {
                // 一次開多個分頁時瀏覽器可能會擋彈出視窗
                eprintln!("ℹ️ {} sites; allow pop-ups if the browser blocks some tabs", urls.len());
            }
            for url in urls {
                println!("{}", url);
            }
        }
        Command::AddCategory { name } => {
            let created = organizer.create_category(&name).await?;
            println!("✅ Created category {} ({})", created.name, created.id);
        }
        Command::AddSite {
            category_id,
            title,
            url,
        } => {
            let created = organizer
                .create_site(NewSite {
                    title,
                    url,
                    category_id: CategoryId(category_id),
                })
                .await?;
            println!("✅ Created site {} ({})", created.title, created.id);
        }
        Command::RenameCategory { id, name } => {
            organizer.rename_category(CategoryId(id), &name).await?;
            println!("✅ Renamed category {}", id);
        }
        Command::RenameSite { id, title } => {
            organizer.rename_site(SiteId(id), &title).await?;
            println!("✅ Renamed site {}", id);
        }
        Command::DeleteCategory { id } => {
            organizer.delete_category(CategoryId(id)).await?;
            println!("✅ Deleted category {}", id);
        }
        Command::DeleteSite { id } => {
            organizer.delete_site(SiteId(id)).await?;
            println!("✅ Deleted site {}", id);
        }
    }

    organizer.shutdown().await;
    Ok(())
}

fn print_plan(plan: &PersistencePlan) {
    println!("📤 Backend calls:");
    for (index, call) in plan.calls().iter().enumerate() {
        println!("  {}. {}", index + 1, call);
    }
}

fn print_collection(collection: &Collection) {
    for category in collection.categories() {
        println!("[{}] {} (category-{})", category.order, category.name, category.id);
        for site in &category.sites {
            println!("    [{}] {} <{}> (site-{})", site.order, site.title, site.url, site.id);
        }
    }
}
