//! `ctk status`: where the workspace stands.

use anyhow::Result;
use colored::*;

use super::Session;
use crate::build::load_phase;
use crate::toolchain::PackageManager;
use crate::ui;

fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".red().to_string()
    }
}

pub fn handle(session: &Session) -> Result<()> {
    let last_phase = match &session.workspace {
        Some(ws) => load_phase(ws.root())?,
        None => None,
    };
    let mut table = ui::Table::new(&["Item", "Value"]);

    table.add_row(vec!["Platform".into(), session.platform.family.to_string()]);
    table.add_row(vec![
        "Package manager".into(),
        PackageManager::for_platform(session.platform.family).to_string(),
    ]);
    table.add_row(vec!["Variant".into(), session.state.variant.to_string().cyan().to_string()]);
    table.add_row(vec!["Subsystem".into(), session.state.subsystem.to_string().cyan().to_string()]);
    table.add_row(vec![
        "Last phase".into(),
        last_phase.map_or_else(|| "-".to_string(), |phase| phase.to_string()),
    ]);

    match &session.workspace {
        Some(ws) => {
            let executable = ws.executable(&session.platform);
            table.add_row(vec!["Workspace".into(), ws.root().display().to_string()]);
            table.add_row(vec!["CMakeLists.txt".into(), yes_no(ws.build_script().is_file())]);
            table.add_row(vec!["Build directory".into(), yes_no(ws.build_dir().is_dir())]);
            table.add_row(vec!["Stale marker".into(), yes_no(ws.marker().exists())]);
            table.add_row(vec![
                format!("Executable ({})", platform_exe(&executable)),
                yes_no(executable.is_file()),
            ]);
        }
        None => {
            table.add_row(vec![
                "Workspace".into(),
                format!("{} (not a directory)", session.root.display()).red().to_string(),
            ]);
        }
    }

    table.print();
    Ok(())
}

fn platform_exe(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
