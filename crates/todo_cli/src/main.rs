//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire config, logging, store, repository and query engine end to end.
//! - Print a short deterministic report for local sanity checks.

use std::error::Error;
use std::sync::Arc;
use todo_core::{
    apply_filters_and_sort, core_version, init_from_config, open_db, open_db_in_memory,
    CoreConfig, InMemoryCloudStore, SessionIdentity, SqliteTaskStore, SyncAwareTaskRepository,
    TaskColor, TaskQuery, TaskService,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("todo_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let mut config = CoreConfig::from_file(&path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            config
        }
        None => CoreConfig::from_env()?,
    };
    let file_logging = init_from_config(&config)?;

    let conn = match &config.db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteTaskStore::try_new(&conn)?;
    let repo = SyncAwareTaskRepository::new(
        store,
        Arc::new(InMemoryCloudStore::new()),
        Arc::new(SessionIdentity::signed_out()),
    );
    let service = TaskService::new(repo);

    if service.repository().get_task_count()? == 0 {
        service.add_task("Try the to-do core", "Created by todo_cli", TaskColor::Blue)?;
    }

    let tasks = service.repository().list_tasks()?;
    let view = apply_filters_and_sort(&tasks, &TaskQuery::default());
    let completed = service.repository().get_completed_task_count()?;
    log::info!(
        "event=cli_probe module=cli status=ok total={} completed={}",
        tasks.len(),
        completed
    );

    println!("todo_core version={}", core_version());
    println!("file_logging={file_logging}");
    println!("tasks total={} completed={}", tasks.len(), completed);
    for task in &view {
        let mark = if task.is_completed { 'x' } else { ' ' };
        println!(
            "[{mark}] #{} {} ({})",
            task.id,
            task.heading,
            task.priority.display_name()
        );
    }
    Ok(())
}
