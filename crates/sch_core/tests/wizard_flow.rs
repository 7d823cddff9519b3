use std::cell::{Cell, RefCell};

use pretty_assertions::assert_eq;

use sch_core::domain::{
    Category, Coordinates, Incident, IncidentQuery, IncidentStatus, Level, Location, Page,
    PhotoBlob,
};
use sch_core::error::AppError;
use sch_core::geo::offset_north;
use sch_core::remote::IncidentApi;
use sch_core::store::{DraftStore, KvStore};
use sch_core::wizard::steps::{description, photos};
use sch_core::wizard::{
    AdvanceOutcome, AdvanceStart, CreateIncidentRequest, RetreatOutcome, WizardConfig,
    WizardController, WizardPatch, WizardState, WizardStep,
};

const CASABLANCA: Coordinates = Coordinates {
    latitude: 33.5731,
    longitude: -7.5898,
};

#[derive(Default)]
struct MockIncidentApi {
    nearby: Vec<Incident>,
    fail_list: bool,
    fail_create: bool,
    list_calls: Cell<usize>,
    created: RefCell<Vec<(CreateIncidentRequest, usize)>>,
}

impl IncidentApi for MockIncidentApi {
    fn list_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>, AppError> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.fail_list {
            return Err(AppError::new("API_UNREACHABLE", "offline").with_retryable(true));
        }
        let content: Vec<Incident> = self
            .nearby
            .iter()
            .filter(|i| query.category.as_deref().map_or(true, |c| c == i.category))
            .cloned()
            .collect();
        Ok(Page {
            total_elements: content.len() as u64,
            total_pages: 1,
            number: 0,
            size: query.size,
            content,
        })
    }

    fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(Vec::new())
    }

    fn create_incident(
        &self,
        request: &CreateIncidentRequest,
        photos: &[PhotoBlob],
    ) -> Result<Incident, AppError> {
        if self.fail_create {
            return Err(AppError::new("API_INCIDENT_CREATE_FAILED", "Server error")
                .with_details("status=503")
                .with_retryable(true));
        }
        self.created
            .borrow_mut()
            .push((request.clone(), photos.len()));
        Ok(Incident {
            id: 42,
            title: request.title.clone(),
            description: Some(request.description.clone()),
            category: request.category.clone(),
            status: IncidentStatus::New,
            latitude: request.latitude,
            longitude: request.longitude,
            address: Some(request.address.clone()),
            district: Some(request.district.clone()),
            priority: Some(request.priority),
            urgency_level: Some(request.urgency_level),
            visibility: Some(request.visibility),
            photo_urls: Vec::new(),
            created_at: None,
            updated_at: None,
        })
    }
}

fn photo() -> PhotoBlob {
    PhotoBlob::new("pothole.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]).unwrap()
}

fn nearby(id: i64, metres: f64, status: IncidentStatus) -> Incident {
    let at = offset_north(&CASABLANCA, metres);
    Incident {
        id,
        title: "Existing report".to_string(),
        description: None,
        category: "ROAD".to_string(),
        status,
        latitude: at.latitude,
        longitude: at.longitude,
        address: None,
        district: None,
        priority: None,
        urgency_level: None,
        visibility: None,
        photo_urls: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

fn controller(kv: &KvStore) -> WizardController<'_> {
    WizardController::initialize(DraftStore::new(kv), WizardConfig::default()).expect("init")
}

/// Drive the wizard through every input step with valid data.
fn fill_to_review(wizard: &mut WizardController<'_>, api: &MockIncidentApi) {
    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    assert!(matches!(wizard.advance(api).unwrap(), AdvanceOutcome::Advanced { .. }));

    let added = photos::add(wizard.state(), vec![photo()]);
    wizard.update(added.patch).unwrap();
    assert!(matches!(wizard.advance(api).unwrap(), AdvanceOutcome::Advanced { .. }));

    wizard
        .update(WizardPatch::new().location(Location::new(CASABLANCA, "Casablanca")))
        .unwrap();
    assert!(matches!(wizard.advance(api).unwrap(), AdvanceOutcome::Advanced { .. }));

    wizard
        .update(description::set_title("Large pothole on main road"))
        .unwrap();
    wizard
        .update(description::set_description("Deep hole near the tram stop"))
        .unwrap();
    assert!(matches!(wizard.advance(api).unwrap(), AdvanceOutcome::Advanced { .. }));
    assert_eq!(wizard.current_step(), WizardStep::Review);
}

#[test]
fn jump_to_only_allows_visited_steps() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let mut wizard = controller(&kv);

    assert_eq!(wizard.jump_to(2).unwrap_err().code, "WIZARD_STEP_LOCKED");
    assert_eq!(wizard.current_step(), WizardStep::Category);

    fill_to_review(&mut wizard, &api);
    for target in (1..=5).rev() {
        assert_eq!(wizard.jump_to(target).unwrap().number(), target);
        for ahead in target + 1..=5 {
            let err = wizard.jump_to(ahead).unwrap_err();
            assert_eq!(err.code, "WIZARD_STEP_LOCKED");
            assert_eq!(wizard.current_step().number(), target);
        }
    }
    assert_eq!(wizard.jump_to(0).unwrap_err().code, "WIZARD_STEP_INVALID");
    assert_eq!(wizard.jump_to(6).unwrap_err().code, "WIZARD_STEP_INVALID");
}

#[test]
fn advance_completes_only_the_current_step_and_stops_at_review() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let mut wizard = controller(&kv);

    let outcome = wizard.advance(&api).unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Blocked { step: WizardStep::Category, .. }));
    assert!(wizard.state().completed_steps.is_empty());

    fill_to_review(&mut wizard, &api);
    let completed: Vec<u8> = wizard
        .state()
        .completed_steps
        .iter()
        .map(|s| s.number())
        .collect();
    assert_eq!(completed, vec![1, 2, 3, 4]);

    assert_eq!(wizard.advance(&api).unwrap(), AdvanceOutcome::AtFinalStep);
    assert_eq!(wizard.current_step(), WizardStep::Review);
    assert!(!wizard.state().completed_steps.contains(&WizardStep::Review));
}

#[test]
fn retreat_walks_back_then_exits() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    wizard.advance(&api).unwrap();

    assert_eq!(
        wizard.retreat().unwrap(),
        RetreatOutcome::Moved(WizardStep::Category)
    );
    assert_eq!(wizard.retreat().unwrap(), RetreatOutcome::ExitWizard);
    assert_eq!(wizard.current_step(), WizardStep::Category);
}

#[test]
fn every_update_is_written_through_and_survives_reload() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let saved: WizardState = {
        let mut wizard = controller(&kv);
        fill_to_review(&mut wizard, &api);
        wizard.jump_to(3).unwrap();
        wizard
            .update(WizardPatch::new().urgency_level(Level::High).anonymous(true))
            .unwrap();
        wizard.state().clone()
    };

    let reloaded = controller(&kv);
    assert_eq!(reloaded.state(), &saved);
    assert_eq!(reloaded.current_step(), WizardStep::Location);
}

#[test]
fn old_draft_without_completed_steps_loads_with_empty_set() {
    let kv = KvStore::in_memory().unwrap();
    kv.set(
        sch_core::store::DRAFT_KEY,
        r#"{"version":1,"state":{"step":1,"category":"ROAD","title":"Broken streetlight"}}"#,
    )
    .unwrap();
    let wizard = controller(&kv);
    assert!(wizard.state().completed_steps.is_empty());
    assert_eq!(wizard.state().category.as_deref(), Some("ROAD"));
    assert_eq!(wizard.state().urgency_level, Level::Medium);
}

#[test]
fn unreadable_draft_starts_fresh() {
    let kv = KvStore::in_memory().unwrap();
    kv.set(sch_core::store::DRAFT_KEY, r#"{"version":1,"state":{"photos":"nope"}}"#)
        .unwrap();
    let wizard = controller(&kv);
    assert_eq!(wizard.state(), &WizardState::default());
}

#[test]
fn submit_without_category_or_location_makes_no_network_call() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    wizard.update(WizardPatch::new().photos(vec![photo()])).unwrap();

    let err = wizard.submit(&api).unwrap_err();
    assert_eq!(err.code, "WIZARD_SUBMIT_INCOMPLETE");

    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    let err = wizard.submit(&api).unwrap_err();
    assert_eq!(err.details.as_deref(), Some("field=location"));

    assert!(api.created.borrow().is_empty());
    assert!(!wizard.is_submitting());
}

#[test]
fn end_to_end_submission_sends_fields_verbatim_and_clears_draft() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    fill_to_review(&mut wizard, &api);

    let created = wizard.submit(&api).expect("submit");
    assert_eq!(created.id, 42);

    let sent = api.created.borrow();
    assert_eq!(sent.len(), 1);
    let (request, photo_count) = &sent[0];
    assert_eq!(
        request,
        &CreateIncidentRequest {
            title: "Large pothole on main road".to_string(),
            description: "Deep hole near the tram stop".to_string(),
            latitude: 33.5731,
            longitude: -7.5898,
            address: "Casablanca".to_string(),
            category: "ROAD".to_string(),
            district: "Downtown".to_string(),
            urgency_level: Level::Medium,
            visibility: sch_core::domain::Visibility::Public,
            anonymous: false,
            priority: Level::Medium,
        }
    );
    assert_eq!(*photo_count, 1);
    assert_eq!(request.description.chars().count(), 28);

    assert!(!DraftStore::new(&kv).exists().unwrap());
    assert_eq!(wizard.state(), &WizardState::default());
}

#[test]
fn failed_submission_keeps_state_and_draft_for_retry() {
    let kv = KvStore::in_memory().unwrap();
    let ok_api = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    fill_to_review(&mut wizard, &ok_api);
    let before = wizard.state().clone();

    let failing = MockIncidentApi {
        fail_create: true,
        ..MockIncidentApi::default()
    };
    let err = wizard.submit(&failing).unwrap_err();
    assert!(err.retryable);
    assert_eq!(wizard.state(), &before);
    assert!(!wizard.is_submitting());
    assert_eq!(DraftStore::new(&kv).load().unwrap().as_ref(), Some(&before));

    wizard.submit(&ok_api).expect("retry succeeds");
}

#[test]
fn second_submission_while_in_flight_is_rejected() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    fill_to_review(&mut wizard, &api);

    let ticket = wizard.begin_submit().expect("first submit");
    assert!(wizard.is_submitting());
    assert_eq!(
        wizard.begin_submit().unwrap_err().code,
        "WIZARD_SUBMIT_IN_FLIGHT"
    );
    assert_eq!(
        wizard.update(WizardPatch::new().title("Changed mid-flight")).unwrap_err().code,
        "WIZARD_SUBMIT_IN_FLIGHT"
    );

    let result = api.create_incident(&ticket.request, &ticket.photos);
    wizard.complete_submit(ticket, result).expect("complete");
    assert_eq!(api.created.borrow().len(), 1);
}

#[test]
fn overlapping_runs_on_one_store_create_a_single_incident() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("smartcityhub.sqlite");
    let api = MockIncidentApi::default();

    let kv_a = KvStore::open(&db_path).unwrap();
    let mut first = controller(&kv_a);
    fill_to_review(&mut first, &api);

    let kv_b = KvStore::open(&db_path).unwrap();
    let mut second = controller(&kv_b);
    assert_eq!(second.state(), first.state());

    let ticket = first.begin_submit().expect("first run submits");
    let err = second.begin_submit().unwrap_err();
    assert_eq!(err.code, "WIZARD_SUBMIT_IN_FLIGHT");
    assert!(!second.is_submitting());

    let result = api.create_incident(&ticket.request, &ticket.photos);
    first.complete_submit(ticket, result).expect("complete");

    // The lock is free again, but the draft the second run loaded is gone.
    assert_eq!(second.begin_submit().unwrap_err().code, "WIZARD_DRAFT_GONE");
    assert!(!DraftStore::new(&kv_b).submission_locked().unwrap());
    assert_eq!(api.created.borrow().len(), 1);
}

#[test]
fn failed_submission_releases_the_store_lock() {
    let kv = KvStore::in_memory().unwrap();
    let ok_api = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    fill_to_review(&mut wizard, &ok_api);

    let failing = MockIncidentApi {
        fail_create: true,
        ..MockIncidentApi::default()
    };
    wizard.submit(&failing).unwrap_err();
    assert!(!DraftStore::new(&kv).submission_locked().unwrap());
}

#[test]
fn aborted_submission_unlocks_the_wizard() {
    let kv = KvStore::in_memory().unwrap();
    let api = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    fill_to_review(&mut wizard, &api);
    let before = wizard.state().clone();

    let ticket = wizard.begin_submit().expect("submit");
    assert!(DraftStore::new(&kv).submission_locked().unwrap());
    wizard.abort_submit(ticket);

    assert!(!wizard.is_submitting());
    assert!(!DraftStore::new(&kv).submission_locked().unwrap());
    assert_eq!(wizard.state(), &before);
    assert!(wizard.update(WizardPatch::new().title("Large pothole on Main Road")).unwrap());
    wizard.submit(&api).expect("submits after abort");
    assert_eq!(api.created.borrow().len(), 1);
}

#[test]
fn duplicate_nearby_blocks_leaving_location_step() {
    let kv = KvStore::in_memory().unwrap();
    let clean = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    wizard.advance(&clean).unwrap();
    wizard.update(WizardPatch::new().photos(vec![photo()])).unwrap();
    wizard.advance(&clean).unwrap();
    wizard
        .update(WizardPatch::new().location(Location::new(CASABLANCA, "Casablanca")))
        .unwrap();

    let api = MockIncidentApi {
        nearby: vec![nearby(7, 50.0, IncidentStatus::InProgress)],
        ..MockIncidentApi::default()
    };
    match wizard.advance(&api).unwrap() {
        AdvanceOutcome::DuplicateFound { duplicate } => {
            assert_eq!(duplicate.incident.id, 7);
            assert!((duplicate.distance_m - 50.0).abs() < 0.5);
        }
        other => panic!("expected duplicate, got {other:?}"),
    }
    assert_eq!(wizard.current_step(), WizardStep::Location);
    assert!(!wizard.state().completed_steps.contains(&WizardStep::Location));
    assert_eq!(api.list_calls.get(), 1);
}

#[test]
fn duplicate_check_failure_fails_open() {
    let kv = KvStore::in_memory().unwrap();
    let clean = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    wizard.advance(&clean).unwrap();
    wizard.update(WizardPatch::new().photos(vec![photo()])).unwrap();
    wizard.advance(&clean).unwrap();
    wizard
        .update(WizardPatch::new().location(Location::new(CASABLANCA, "Casablanca")))
        .unwrap();

    let offline = MockIncidentApi {
        fail_list: true,
        ..MockIncidentApi::default()
    };
    assert_eq!(
        wizard.advance(&offline).unwrap(),
        AdvanceOutcome::Advanced {
            from: WizardStep::Location,
            to: WizardStep::Description
        }
    );
}

#[test]
fn late_duplicate_result_is_discarded_after_state_changes() {
    let kv = KvStore::in_memory().unwrap();
    let clean = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    wizard.advance(&clean).unwrap();
    wizard.update(WizardPatch::new().photos(vec![photo()])).unwrap();
    wizard.advance(&clean).unwrap();
    wizard
        .update(WizardPatch::new().location(Location::new(CASABLANCA, "Casablanca")))
        .unwrap();

    let AdvanceStart::NeedsDuplicateCheck(ticket) = wizard.begin_advance().unwrap() else {
        panic!("expected a duplicate check");
    };
    assert!(wizard.is_checking_duplicates());

    // Reporter edits the address while the lookup is still running.
    wizard
        .update(WizardPatch::new().location(Location::new(CASABLANCA, "Casablanca, Maarif")))
        .unwrap();

    let outcome = wizard.complete_advance(ticket, Ok(None)).unwrap();
    assert_eq!(outcome, AdvanceOutcome::Stale);
    assert_eq!(wizard.current_step(), WizardStep::Location);
    assert!(!wizard.is_checking_duplicates());
}

#[test]
fn navigating_away_abandons_pending_check() {
    let kv = KvStore::in_memory().unwrap();
    let clean = MockIncidentApi::default();
    let mut wizard = controller(&kv);
    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    wizard.advance(&clean).unwrap();
    wizard.update(WizardPatch::new().photos(vec![photo()])).unwrap();
    wizard.advance(&clean).unwrap();
    wizard
        .update(WizardPatch::new().location(Location::new(CASABLANCA, "Casablanca")))
        .unwrap();

    let AdvanceStart::NeedsDuplicateCheck(ticket) = wizard.begin_advance().unwrap() else {
        panic!("expected a duplicate check");
    };
    wizard.retreat().unwrap();
    assert_eq!(
        wizard.complete_advance(ticket, Ok(None)).unwrap(),
        AdvanceOutcome::Stale
    );
    assert_eq!(wizard.current_step(), WizardStep::Photos);
}

#[test]
fn discard_clears_draft_and_state() {
    let kv = KvStore::in_memory().unwrap();
    let mut wizard = controller(&kv);
    wizard.update(WizardPatch::new().category("ROAD")).unwrap();
    assert!(DraftStore::new(&kv).exists().unwrap());

    wizard.discard().unwrap();
    assert!(!DraftStore::new(&kv).exists().unwrap());
    assert!(wizard.state().is_blank());
}
