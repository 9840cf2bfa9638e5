//! Tool command handlers
//!
//! Handles `ctk tools check` and `ctk tools install`.

use anyhow::Result;
use colored::*;

use super::Session;
use crate::toolchain::{
    self, AvailabilityChecker, PackageManager, Provisioner, SystemProbe, SystemRunner,
    ToolCheckResult, ToolSpec,
};
use crate::ui::{self, InquirePrompter};

fn checker(session: &Session) -> AvailabilityChecker<SystemProbe> {
    let timeout = session.config.tools.check_timeout();
    AvailabilityChecker::new(SystemProbe::new(timeout)).with_timeout(timeout)
}

fn required(session: &Session) -> (PackageManager, Vec<ToolSpec>) {
    let manager = PackageManager::for_platform(session.platform.family);
    let tools = toolchain::required_tools(
        &session.config.tools.required,
        manager,
        &session.config.tools.aliases,
    );
    (manager, tools)
}

fn print_table(results: &[ToolCheckResult]) {
    let mut table = ui::Table::new(&["Status", "Tool", "Package"]);
    for result in results {
        let status = if result.available {
            "found".green().to_string()
        } else {
            "missing".red().to_string()
        };
        table.add_row(vec![
            status,
            result.tool.name.clone(),
            result.tool.package_name().to_string(),
        ]);
    }
    table.print();
}

/// `ctk tools check`: probe every required tool. Returns true if all are present.
pub async fn check(session: &Session) -> Result<bool> {
    let (_, tools) = required(session);
    let results = checker(session).check_specs(&tools).await;
    print_table(&results);

    for result in results.iter().filter(|r| !r.available) {
        session.notifier.error(&format!(
            "{} not found, please install it and add it to PATH.",
            result.tool.name
        ));
    }
    Ok(results.iter().all(|r| r.available))
}

/// `ctk tools install`: install whatever is missing.
pub async fn install(session: &Session) -> Result<bool> {
    let (manager, tools) = required(session);
    let checker = checker(session);

    let missing: Vec<ToolSpec> = checker
        .check_specs(&tools)
        .await
        .into_iter()
        .filter(|r| !r.available)
        .map(|r| r.tool)
        .collect();

    if missing.is_empty() {
        session.notifier.info("All required tools are installed.");
        return Ok(true);
    }

    let names: Vec<&str> = missing.iter().map(|t| t.name.as_str()).collect();
    println!(
        "{} Missing: {} (via {})",
        "!".yellow(),
        names.join(", ").bold(),
        manager
    );

    let provisioner = Provisioner::new(
        manager,
        SystemRunner::new(session.config.tools.install_timeout()),
    )
    .with_progress(true);
    let prompter = InquirePrompter;

    match toolchain::provision(&provisioner, &checker, &missing, &prompter, session.notifier.as_ref())
        .await
    {
        Ok(report) => {
            toolchain::notify_report(&report, session.notifier.as_ref());
            Ok(report.all_succeeded())
        }
        Err(e) => {
            session.notifier.error(&e.to_string());
            Ok(false)
        }
    }
}
