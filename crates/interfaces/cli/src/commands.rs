use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use vaadly_model::roster;
use vaadly_store::reports;
use vaadly_store::{portability, DocumentStore};

use crate::{BackupCommands, BuildingCommands, TenantCommands};

pub fn status(store: &DocumentStore, today: NaiveDate) -> Result<()> {
    let doc = store.document();
    let Some(building) = store.current_building() else {
        bail!("no current building");
    };
    let summary = reports::dashboard_summary(building, today);
    let inventory = reports::inventory_totals(doc);

    println!("{} / {}", doc.settings.title, building.name);
    println!();
    println!("Yearly income:      {:>10.2}", summary.yearly_income);
    println!("Yearly expenses:    {:>10.2}", summary.yearly_expenses);
    println!("Yearly balance:     {:>10.2}", summary.yearly_balance);
    println!("Petty cash balance: {:>10.2}", summary.petty_cash_balance);
    println!("Open issues:        {:>10}", summary.open_issues);
    println!("Tenants in debt:    {:>10}", summary.debtor_count);
    for (tenant, months) in reports::debtors(building, today) {
        println!(
            "  {} (apt {}) owes {:.2} for {} month(s)",
            tenant.name,
            tenant.apartment,
            reports::total_due(building, tenant, today),
            months.len()
        );
    }
    println!();
    println!(
        "Inventory: {} products, {} units, stock value {:.2}",
        inventory.products, inventory.units, inventory.stock_value
    );
    match store.last_backup_date()? {
        Some(date) => println!("Last backup: {date}"),
        None => println!("Last backup: never"),
    }
    Ok(())
}

pub fn buildings(store: &mut DocumentStore, command: BuildingCommands) -> Result<()> {
    match command {
        BuildingCommands::List => {
            let doc = store.document();
            for building in &doc.buildings {
                let marker = if building.id == doc.current_building_id {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {}  {} ({} tenants)",
                    building.id,
                    building.name,
                    building.tenants.len()
                );
            }
        }
        BuildingCommands::Add { name } => {
            let id = store.add_building(&name)?;
            println!("added building {name} ({id}) and made it current");
        }
        BuildingCommands::Switch { id } => {
            store.switch_current_building(&id)?;
            println!(
                "current building: {}",
                store
                    .current_building()
                    .map(|b| b.name.as_str())
                    .unwrap_or("?")
            );
        }
        BuildingCommands::Delete { id } => {
            let before = store.document().buildings.len();
            store.delete_building(&id)?;
            if store.document().buildings.len() == before {
                println!("not deleted (unknown id, or it is the last building)");
            } else {
                println!("deleted building {id}");
            }
        }
    }
    Ok(())
}

pub fn backup(
    store: &mut DocumentStore,
    command: BackupCommands,
    today: NaiveDate,
) -> Result<()> {
    match command {
        BackupCommands::Run => {
            if store.run_daily_backup_if_due(today) {
                println!("snapshot written for {today}");
            } else {
                println!("no snapshot due");
            }
        }
        BackupCommands::Force { output } => {
            let bytes = store.force_backup(today)?;
            let path =
                output.unwrap_or_else(|| PathBuf::from(portability::export_file_name(today)));
            fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
            println!("snapshot written to {}", path.display());
        }
        BackupCommands::List => {
            let snapshots = store.list_snapshots()?;
            if snapshots.is_empty() {
                println!("no snapshots retained");
            }
            for snapshot in snapshots {
                println!(
                    "{}  {:>8} bytes  {}",
                    snapshot.date,
                    snapshot.size_bytes,
                    &snapshot.digest[..12]
                );
            }
        }
        BackupCommands::Prune => {
            let removed = store.prune_old_snapshots()?;
            println!("pruned {removed} snapshot(s)");
        }
    }
    Ok(())
}

pub fn export(store: &DocumentStore, output: Option<PathBuf>, today: NaiveDate) -> Result<()> {
    let bytes = store.export_snapshot()?;
    let path = output.unwrap_or_else(|| PathBuf::from(portability::export_file_name(today)));
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("exported to {}", path.display());
    Ok(())
}

pub fn import(store: &mut DocumentStore, path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    store.import_snapshot(&bytes)?;
    let doc = store.document();
    println!(
        "imported: {} building(s), {} employee(s), {} product(s)",
        doc.buildings.len(),
        doc.global_employees.len(),
        doc.inventory_products.len()
    );
    Ok(())
}

pub fn tenants(
    store: &mut DocumentStore,
    command: TenantCommands,
    today: NaiveDate,
) -> Result<()> {
    match command {
        TenantCommands::ImportCsv { path, entrance } => {
            let text =
                fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let tenants = roster::parse_tenants(&text, entrance.into());
            if tenants.is_empty() {
                bail!("no usable rows found in {}", path.display());
            }
            let count = tenants.len();
            store.import_tenants(tenants)?;
            println!("imported {count} tenant(s)");
        }
        TenantCommands::ExportCsv { output } => {
            let Some(building) = store.current_building() else {
                bail!("no current building");
            };
            let text = roster::render_tenants(&building.tenants);
            let path = output.unwrap_or_else(|| {
                PathBuf::from(format!("tenants-{}-{today}.csv", building.name))
            });
            fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("exported roster to {}", path.display());
        }
    }
    Ok(())
}

pub fn reset(store: &mut DocumentStore, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to delete all data without --yes");
    }
    store.reset()?;
    println!("all data cleared; default document installed");
    Ok(())
}
