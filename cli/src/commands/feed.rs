use clap::Args;
use sch_core::domain::{IncidentQuery, IncidentStatus};
use sch_core::error::AppError;
use sch_core::feed::{page_label, rows};
use sch_core::remote::IncidentApi;
use time::OffsetDateTime;

use crate::context::AppContext;

#[derive(Debug, Args)]
pub struct IncidentsArgs {
    /// NEW, ASSIGNED, IN_PROGRESS, RESOLVED, VALIDATED, REJECTED, REOPENED or CLOSED
    #[arg(long)]
    pub status: Option<String>,

    /// Category code, e.g. ROAD
    #[arg(long)]
    pub category: Option<String>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 20)]
    pub size: u32,
}

pub fn parse_status(raw: &str) -> Result<IncidentStatus, AppError> {
    IncidentStatus::from_str(raw).ok_or_else(|| {
        let known: Vec<&str> = IncidentStatus::ALL.iter().map(|s| s.as_str()).collect();
        AppError::new("VALIDATION_STATUS_UNKNOWN", "Unknown incident status")
            .with_details(format!("status={raw}; expected one of {}", known.join(", ")))
    })
}

pub fn build_query(args: &IncidentsArgs) -> Result<IncidentQuery, AppError> {
    if args.page == 0 || args.size == 0 {
        return Err(AppError::new(
            "VALIDATION_PAGE_INVALID",
            "Page and size start at 1",
        ));
    }
    Ok(IncidentQuery {
        status: args.status.as_deref().map(parse_status).transpose()?,
        category: args
            .category
            .as_deref()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty()),
        page: args.page - 1,
        size: args.size,
    })
}

pub fn incidents(ctx: &AppContext, args: IncidentsArgs) -> Result<(), AppError> {
    let query = build_query(&args)?;
    let page = ctx.incidents()?.list_incidents(&query)?;
    let now = OffsetDateTime::now_utc();

    if page.content.is_empty() {
        println!("No incidents found.");
    }
    for row in rows(&page, &now) {
        println!(
            "#{:<6} {:<12} {:<12} {:<10} {}",
            row.id,
            row.status.label(),
            row.category,
            row.age,
            row.title
        );
        println!("        {}", row.address);
    }
    println!("{}", page_label(&page));
    if page.has_next() {
        println!("More: --page {}", page.number + 2);
    }
    Ok(())
}

pub fn categories(ctx: &AppContext) -> Result<(), AppError> {
    let categories = ctx.incidents()?.list_categories()?;
    if categories.is_empty() {
        println!("The server has no categories configured.");
    }
    for c in categories {
        match c.description.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(desc) => println!("{:<14} {} - {desc}", c.code, c.name),
            None => println!("{:<14} {}", c.code, c.name),
        }
    }
    Ok(())
}
