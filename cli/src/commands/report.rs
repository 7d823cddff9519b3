use std::path::PathBuf;

use clap::{ArgAction, Subcommand};
use sch_core::domain::{Coordinates, Level, PhotoBlob, ValidationIssue, Visibility};
use sch_core::error::AppError;
use sch_core::preview;
use sch_core::remote::{FixedGeolocator, Geocoder, IncidentApi};
use sch_core::wizard::steps::{self, category, description, location, photos, review};
use sch_core::wizard::{AdvanceOutcome, RetreatOutcome, WizardController, WizardPatch};

use crate::context::AppContext;

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Current step and a preview of the draft
    Show,

    /// Summary of every section with the step that edits it
    Review,

    /// Choose the category; without a code, list the available ones
    Category { code: Option<String> },

    /// Attach image files (at most 10 in total)
    AddPhoto {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove a photo by its position in `report review` (starting at 1)
    RemovePhoto { position: usize },

    /// Use a known position as the current device location
    Locate {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Type the address instead; it is looked up to find coordinates
    Address { text: String },

    District { name: String },

    Title { text: String },

    /// Up to 500 characters; longer text is cut
    Description { text: String },

    /// LOW, MEDIUM, HIGH or CRITICAL
    Urgency { level: String },

    /// PUBLIC or PRIVATE
    Visibility { value: String },

    Anonymous {
        #[arg(action = ArgAction::Set)]
        value: bool,
    },

    /// Validate this step and move to the next one
    Next,

    /// Go back one step
    Back,

    /// Return to an earlier step (1-5)
    Jump { step: u8 },

    /// Send the report
    Submit,

    /// Throw the draft away
    Discard,
}

pub fn parse_level(raw: &str) -> Result<Level, AppError> {
    Level::from_str(raw).ok_or_else(|| {
        AppError::new("VALIDATION_URGENCY_UNKNOWN", "Urgency must be LOW, MEDIUM, HIGH or CRITICAL")
            .with_details(format!("urgency={raw}"))
    })
}

pub fn parse_visibility(raw: &str) -> Result<Visibility, AppError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "PUBLIC" => Ok(Visibility::Public),
        "PRIVATE" => Ok(Visibility::Private),
        _ => Err(AppError::new("VALIDATION_VISIBILITY_UNKNOWN", "Visibility must be PUBLIC or PRIVATE")
            .with_details(format!("visibility={raw}"))),
    }
}

fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        println!("  - {}: {}", issue.field, issue.message);
    }
}

fn print_step(wizard: &WizardController<'_>) {
    let state = wizard.state();
    println!("{}", preview::project(state));
    let issues = steps::validate_step(state.step, state);
    if !issues.is_empty() && state.step != sch_core::wizard::WizardStep::FINAL {
        println!("Before continuing:");
        print_issues(&issues);
    }
}

fn apply(wizard: &mut WizardController<'_>, patch: WizardPatch) -> Result<(), AppError> {
    if !wizard.update(patch)? {
        println!("(no change)");
    }
    Ok(())
}

fn print_review(wizard: &WizardController<'_>) {
    for section in review::summary(wizard.state()) {
        println!(
            "{} (edit: report jump {})",
            section.kind.heading(),
            section.edit_step.number()
        );
        for line in &section.lines {
            println!("    {line}");
        }
    }
    let issues = steps::validate_all(wizard.state());
    if issues.is_empty() {
        println!("Ready to submit: report submit");
    } else {
        println!("Missing before submission:");
        print_issues(&issues);
    }
}

fn print_advance(outcome: &AdvanceOutcome) {
    match outcome {
        AdvanceOutcome::Advanced { to, .. } => println!("Now on step {to}"),
        AdvanceOutcome::AtFinalStep => {
            println!("This is the last step. Use `report submit` to send the report.")
        }
        AdvanceOutcome::Blocked { step, issues } => {
            println!("Step {step} is not complete yet:");
            print_issues(issues);
        }
        AdvanceOutcome::DuplicateFound { duplicate } => {
            let incident = &duplicate.incident;
            println!(
                "A similar {} report is already open {:.0} m away: #{} \"{}\" ({}).",
                incident.category,
                duplicate.distance_m,
                incident.id,
                incident.title,
                incident.status.label()
            );
            println!("Adjust the location or category, or discard this draft.");
        }
        AdvanceOutcome::Stale => println!("The report changed meanwhile; run `report next` again."),
    }
}

pub fn run(ctx: &AppContext, command: ReportCommand) -> Result<(), AppError> {
    let mut wizard = ctx.wizard()?;
    match command {
        ReportCommand::Show => print_step(&wizard),
        ReportCommand::Review => print_review(&wizard),
        ReportCommand::Category { code: None } => {
            for c in ctx.incidents()?.list_categories()? {
                let marker = if wizard.state().category.as_deref() == Some(c.code.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {:<14} {}", c.code, c.name);
            }
        }
        ReportCommand::Category { code: Some(code) } => {
            let categories = ctx.incidents()?.list_categories()?;
            apply(&mut wizard, category::select(&categories, &code)?)?;
            print_step(&wizard);
        }
        ReportCommand::AddPhoto { paths } => {
            let blobs = paths
                .iter()
                .map(|p| PhotoBlob::from_file(p))
                .collect::<Result<Vec<_>, _>>()?;
            let added = photos::add(wizard.state(), blobs);
            apply(&mut wizard, added.patch)?;
            if added.dropped > 0 {
                println!(
                    "{} photo(s) not added: a report holds at most {}.",
                    added.dropped,
                    sch_core::wizard::state::MAX_PHOTOS
                );
            }
            println!("{} photo(s) attached.", wizard.state().photos.len());
        }
        ReportCommand::RemovePhoto { position } => {
            let index = position.checked_sub(1).ok_or_else(|| {
                AppError::new("VALIDATION_PHOTO_INDEX", "Photo positions start at 1")
            })?;
            let patch = photos::remove(wizard.state(), index)?;
            apply(&mut wizard, patch)?;
            println!("{} photo(s) attached.", wizard.state().photos.len());
        }
        ReportCommand::Locate { lat, lon } => {
            let device = FixedGeolocator::new(Some(Coordinates::new(lat, lon)));
            let geocoder = ctx.geocoder()?;
            let patch = location::from_device(&device, geocoder.as_ref().map(|g| g as &dyn Geocoder))?;
            apply(&mut wizard, patch)?;
            print_location(&wizard);
        }
        ReportCommand::Address { text } => {
            let geocoder = ctx.geocoder()?;
            let patch = location::from_address(
                &text,
                geocoder.as_ref().map(|g| g as &dyn Geocoder),
                ctx.config.map_centre(),
            )?;
            apply(&mut wizard, patch)?;
            print_location(&wizard);
        }
        ReportCommand::District { name } => apply(&mut wizard, location::set_district(&name))?,
        ReportCommand::Title { text } => apply(&mut wizard, description::set_title(&text))?,
        ReportCommand::Description { text } => {
            apply(&mut wizard, description::set_description(&text))?;
            println!(
                "{} characters left.",
                description::remaining_chars(wizard.state())
            );
        }
        ReportCommand::Urgency { level } => {
            apply(&mut wizard, description::set_urgency(parse_level(&level)?))?
        }
        ReportCommand::Visibility { value } => {
            apply(&mut wizard, description::set_visibility(parse_visibility(&value)?))?
        }
        ReportCommand::Anonymous { value } => {
            apply(&mut wizard, description::set_anonymous(value))?
        }
        ReportCommand::Next => {
            let api = ctx.incidents()?;
            let outcome = wizard.advance(&api)?;
            print_advance(&outcome);
        }
        ReportCommand::Back => match wizard.retreat()? {
            RetreatOutcome::Moved(step) => println!("Back on step {step}"),
            RetreatOutcome::ExitWizard => {
                println!("Already on the first step. The draft is kept; `report discard` removes it.")
            }
        },
        ReportCommand::Jump { step } => {
            let step = wizard.jump_to(step)?;
            println!("Now on step {step}");
        }
        ReportCommand::Submit => {
            let api = ctx.incidents()?;
            let incident = wizard.submit(&api)?;
            println!(
                "Report #{} submitted ({}). Thank you!",
                incident.id,
                incident.status.label()
            );
        }
        ReportCommand::Discard => {
            wizard.discard()?;
            println!("Draft discarded.");
        }
    }
    Ok(())
}

fn print_location(wizard: &WizardController<'_>) {
    if let Some(loc) = &wizard.state().location {
        println!("Location: {} ({})", loc.address, loc.coordinates().display());
    }
}
