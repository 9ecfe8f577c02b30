use std::collections::HashSet;

use anyhow::Result;
use ratatui::backend::Backend;

use super::actions::{AddOutcome, RosterActions};
use super::events::EventSource;
use super::{draw_over, Session};
use crate::contacts::{dedup_by_number, normalize_number, Contact};
use crate::delivery::{dispatch, dispatch_pool, DispatchEvent, DispatchReport};
use crate::message::normalize_message;
use crate::resolver::{resolve, tokenize_names, Resolution};
use crate::storage::RosterEntry;
use crate::ui::dialogs::{MenuPrompt, PreviewView, ProgressView};
use crate::ui::editor::{ComposePrompt, LinePrompt};
use crate::ui::picker::{PickMode, Picker, PickerLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecipientMode {
    Everyone,
    Pick,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListAction {
    Preview,
    Add,
    Remove,
}

#[derive(Debug, Clone)]
enum AddTarget {
    Existing(RosterEntry),
    New,
}

impl<B: Backend, E: EventSource> Session<B, E> {
    pub(super) fn send_flow(&mut self) -> Result<()> {
        let mut lists = Picker::new("Select lists", self.store.entries(), PickMode::Multi)
            .empty_selection_notice("No selection", "Select at least one list.");
        let Some(entries) = self.run_modal(&mut lists)? else {
            return Ok(());
        };
        let Some((label, contacts)) = self.load_rosters(&entries)? else {
            return Ok(());
        };

        let Some(resolution) = self.choose_recipients(&contacts)? else {
            return Ok(());
        };

        let Some(raw) = self.run_modal(&mut ComposePrompt::new("Compose message", ""))? else {
            return Ok(());
        };
        if raw.trim().is_empty() {
            return Ok(());
        }
        let message = normalize_message(&raw);

        let names = resolution
            .resolved
            .iter()
            .map(|contact| contact.name.clone())
            .collect();
        let mut preview = PreviewView::new(
            label.as_str(),
            names,
            resolution.missing.clone(),
            message.as_str(),
        );
        if self.run_modal(&mut preview)?.is_none() {
            return Ok(());
        }

        if let Err(err) = self.delivery.check_ready() {
            tracing::warn!(%err, "delivery backend not ready");
            return self.notify("Missing script", &err.to_string());
        }
        self.send_with_progress(&resolution.resolved, &message)
    }

    /// Loads and merges the chosen rosters. Any failure becomes a notice and
    /// yields `None`.
    fn load_rosters(&mut self, entries: &[RosterEntry]) -> Result<Option<(String, Vec<Contact>)>> {
        let mut merged = Vec::new();
        for entry in entries {
            match self.store.load(entry) {
                Ok(contacts) => merged.extend(contacts),
                Err(err) => {
                    tracing::warn!(%err, list = %entry.label, "roster unavailable");
                    self.notify("Missing list", &err.to_string())?;
                    return Ok(None);
                }
            }
        }
        let label = entries
            .iter()
            .map(|entry| entry.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let contacts = dedup_by_number(merged);
        if contacts.is_empty() {
            self.notify("Empty list", &format!("{label} has no entries."))?;
            return Ok(None);
        }
        Ok(Some((label, contacts)))
    }

    fn choose_recipients(&mut self, contacts: &[Contact]) -> Result<Option<Resolution>> {
        let mut modes = MenuPrompt::new(
            "Recipients",
            vec![
                ("Everyone".to_string(), Some(RecipientMode::Everyone)),
                ("Pick from list".to_string(), Some(RecipientMode::Pick)),
                ("Type names".to_string(), Some(RecipientMode::Type)),
                ("Back".to_string(), None),
            ],
        );
        let Some(mode) = self.run_modal(&mut modes)? else {
            return Ok(None);
        };

        match mode {
            RecipientMode::Everyone => Ok(Some(resolve(&["all".to_string()], contacts))),
            RecipientMode::Pick => {
                let mut browser = Picker::new("Pick recipients", contacts.to_vec(), PickMode::Multi)
                    .layout(PickerLayout::Wide)
                    .empty_selection_notice("No selection", "Select at least one recipient.");
                Ok(self.run_modal(&mut browser)?.map(|resolved| Resolution {
                    resolved,
                    missing: Vec::new(),
                }))
            }
            RecipientMode::Type => loop {
                let mut prompt = LinePrompt::new("Recipients", "To (comma or space separated):", 66)
                    .width(72);
                let Some(raw) = self.run_modal(&mut prompt)? else {
                    return Ok(None);
                };
                let tokens = tokenize_names(&raw);
                if tokens.is_empty() {
                    return Ok(None);
                }
                let resolution = resolve(&tokens, contacts);
                if !resolution.resolved.is_empty() {
                    tracing::debug!(
                        resolved = resolution.resolved.len(),
                        missing = resolution.missing.len(),
                        "recipients resolved"
                    );
                    return Ok(Some(resolution));
                }
                self.notify("No recipients", "No recipients matched your input.")?;
                if !self.running {
                    return Ok(None);
                }
            },
        }
    }

    fn send_with_progress(&mut self, recipients: &[Contact], message: &str) -> Result<()> {
        tracing::info!(
            recipients = recipients.len(),
            workers = self.config.delivery.workers,
            "dispatch starting"
        );
        let mut progress = ProgressView::new(recipients.len());
        let report = if self.config.delivery.workers > 1 {
            draw_over(&mut self.terminal, &self.landing, &mut progress)?;
            let report = dispatch_pool(
                recipients,
                message,
                self.delivery.as_ref(),
                self.config.delivery.workers,
            );
            for outcome in &report.outcomes {
                progress.finished(outcome);
            }
            report
        } else {
            self.dispatch_visible(recipients, message, &mut progress)?
        };
        progress.complete(&report);
        self.run_modal(&mut progress)?;
        Ok(())
    }

    /// Sequential dispatch, redrawing after every status change.
    fn dispatch_visible(
        &mut self,
        recipients: &[Contact],
        message: &str,
        progress: &mut ProgressView,
    ) -> Result<DispatchReport> {
        let terminal = &mut self.terminal;
        let landing = &self.landing;
        let mut draw_error = None;
        let report = dispatch(
            recipients,
            message,
            self.delivery.as_ref(),
            self.config.delivery.pause(),
            |event| {
                match event {
                    DispatchEvent::Started { contact, .. } => progress.started(&contact.name),
                    DispatchEvent::Finished { result, .. } => progress.finished(result),
                }
                if draw_error.is_none() {
                    draw_error = draw_over(&mut *terminal, landing, &mut *progress).err();
                }
            },
        );
        match draw_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    pub(super) fn list_flow(&mut self) -> Result<()> {
        while self.running {
            let mut menu = MenuPrompt::new(
                "Lists",
                vec![
                    ("Preview".to_string(), Some(ListAction::Preview)),
                    ("Add".to_string(), Some(ListAction::Add)),
                    ("Remove".to_string(), Some(ListAction::Remove)),
                    ("Back".to_string(), None),
                ],
            );
            let Some(action) = self.run_modal(&mut menu)? else {
                return Ok(());
            };
            match action {
                ListAction::Preview => self.list_preview_flow()?,
                ListAction::Add => self.list_add_flow()?,
                ListAction::Remove => self.list_remove_flow()?,
            }
        }
        Ok(())
    }

    fn list_preview_flow(&mut self) -> Result<()> {
        let mut lists = Picker::new("Select list", self.store.entries(), PickMode::Single);
        let Some(entry) = self.run_modal(&mut lists)?.and_then(|picked| picked.into_iter().next())
        else {
            return Ok(());
        };
        let Some(contacts) = self.load_nonempty(&entry)? else {
            return Ok(());
        };
        let mut browser = Picker::new(format!("Preview {}", entry.label), contacts, PickMode::Browse)
            .layout(PickerLayout::Wide);
        self.run_modal(&mut browser)?;
        Ok(())
    }

    fn list_add_flow(&mut self) -> Result<()> {
        let mut options: Vec<(String, Option<AddTarget>)> = self
            .store
            .entries()
            .into_iter()
            .map(|entry| (entry.label.clone(), Some(AddTarget::Existing(entry))))
            .collect();
        options.push(("Create new list".to_string(), Some(AddTarget::New)));
        let Some(target) = self.run_modal(&mut MenuPrompt::new("Add to list", options))? else {
            return Ok(());
        };
        let entry = match target {
            AddTarget::Existing(entry) => entry,
            AddTarget::New => {
                let Some(label) = self.prompt_field("New list", "List name:")? else {
                    return Ok(());
                };
                match self.store.create(&label) {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!(%err, "could not create roster");
                        return self.notify("Invalid list", &err.to_string());
                    }
                }
            }
        };

        let Some(name) = self.prompt_field("Add contact", "Name:")? else {
            return Ok(());
        };
        let Some(number) = self.prompt_field("Add contact", "Number:")? else {
            return Ok(());
        };
        if normalize_number(&number).trim_start_matches('+').is_empty() {
            return self.notify("Invalid number", "A phone number or handle is required.");
        }
        let mut alias_prompt = LinePrompt::new("Add contact", "Alias (optional):", 64);
        let Some(alias) = self.run_modal(&mut alias_prompt)? else {
            return Ok(());
        };

        let outcome = RosterActions::new(&self.store).add_contact(&entry, &name, &number, &alias);
        match outcome {
            Ok(AddOutcome::Added(contact)) => self.notify(
                "Added",
                &format!("Added {} to {}.", contact.name, entry.label),
            ),
            Ok(AddOutcome::Duplicate) => {
                self.notify("Duplicate", "That number already exists in the list.")
            }
            Ok(AddOutcome::InvalidNumber) => {
                self.notify("Invalid number", "A phone number or handle is required.")
            }
            Err(err) => {
                tracing::error!(%err, list = %entry.label, "saving roster failed");
                self.notify("Save failed", &err.to_string())
            }
        }
    }

    fn list_remove_flow(&mut self) -> Result<()> {
        let options: Vec<(String, Option<RosterEntry>)> = self
            .store
            .entries()
            .into_iter()
            .map(|entry| (entry.label.clone(), Some(entry)))
            .collect();
        let Some(entry) = self.run_modal(&mut MenuPrompt::new("Remove from list", options))? else {
            return Ok(());
        };
        let Some(contacts) = self.load_nonempty(&entry)? else {
            return Ok(());
        };

        let mut browser = Picker::new(format!("Remove from {}", entry.label), contacts, PickMode::Multi)
            .layout(PickerLayout::Wide)
            .empty_selection_notice("No selection", "Select at least one contact to remove.");
        let Some(chosen) = self.run_modal(&mut browser)? else {
            return Ok(());
        };
        let mut confirm = MenuPrompt::new(
            "Confirm remove",
            vec![("Remove".to_string(), Some(())), ("Cancel".to_string(), None)],
        );
        if self.run_modal(&mut confirm)?.is_none() {
            return Ok(());
        }

        let numbers: HashSet<String> = chosen.iter().map(|contact| contact.number.clone()).collect();
        let removed = RosterActions::new(&self.store).remove_contacts(&entry, &numbers);
        match removed {
            Ok(_) => self.notify(
                "Removed",
                &format!("Removed {} from {}.", chosen.len(), entry.label),
            ),
            Err(err) => {
                tracing::error!(%err, list = %entry.label, "saving roster failed");
                self.notify("Save failed", &err.to_string())
            }
        }
    }

    fn load_nonempty(&mut self, entry: &RosterEntry) -> Result<Option<Vec<Contact>>> {
        match self.store.load(entry) {
            Ok(contacts) if contacts.is_empty() => {
                self.notify("Empty list", &format!("{} has no entries.", entry.label))?;
                Ok(None)
            }
            Ok(contacts) => Ok(Some(contacts)),
            Err(err) => {
                tracing::warn!(%err, list = %entry.label, "roster unavailable");
                self.notify("Missing list", &err.to_string())?;
                Ok(None)
            }
        }
    }

    /// Single-line prompt; blank input counts as cancel.
    fn prompt_field(&mut self, title: &str, label: &str) -> Result<Option<String>> {
        let mut prompt = LinePrompt::new(title, label, 64);
        Ok(self
            .run_modal(&mut prompt)?
            .filter(|value| !value.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crossterm::event::KeyCode;
    use indexmap::IndexMap;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    use super::*;
    use crate::app::events::{ScriptedEvents, UiEvent};
    use crate::app::state::MenuAction;
    use crate::config::AppConfig;
    use crate::delivery::{Delivery, DeliveryError, DeliveryOutcome};
    use crate::storage::RosterStore;

    type Sent = Arc<Mutex<Vec<(String, String)>>>;

    struct RecordingDelivery {
        sent: Sent,
        failing: &'static str,
        ready: bool,
    }

    impl Delivery for RecordingDelivery {
        fn check_ready(&self) -> Result<(), DeliveryError> {
            if self.ready {
                Ok(())
            } else {
                Err(DeliveryError::MissingScript("/nowhere/send.applescript".into()))
            }
        }

        fn send(&self, handle: &str, text: &str) -> DeliveryOutcome {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((handle.to_string(), text.to_string()));
            }
            if handle == self.failing {
                DeliveryOutcome::failed("not delivered")
            } else {
                DeliveryOutcome::ok("")
            }
        }
    }

    struct Harness {
        _temp: TempDir,
        sent: Sent,
        session: Session<TestBackend, ScriptedEvents>,
    }

    impl Harness {
        fn new(events: ScriptedEvents) -> Self {
            Self::with_delivery(events, true, 1)
        }

        fn with_delivery(events: ScriptedEvents, ready: bool, workers: usize) -> Self {
            let temp = TempDir::new().expect("tempdir");
            let store = RosterStore::new(temp.path(), IndexMap::new());
            let entry = store.create("actives").expect("create roster");
            store
                .save(
                    &entry,
                    &[
                        Contact::new("Ann Lee", "1", "annie"),
                        Contact::new("Bay Michaels", "2", "bay"),
                        Contact::new("Cy Young", "3", ""),
                    ],
                )
                .expect("seed roster");
            let mut config = AppConfig::default();
            config.delivery.pause_ms = 0;
            config.delivery.workers = workers;
            let sent = Sent::default();
            let delivery = RecordingDelivery {
                sent: Arc::clone(&sent),
                failing: "2",
                ready,
            };
            let terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
            let session = Session::new(config, store, Box::new(delivery), terminal, events);
            Self {
                _temp: temp,
                sent,
                session,
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().expect("lock").clone()
        }

        fn screen(&self) -> String {
            let buf = self.session.terminal().backend().buffer();
            let mut out = String::new();
            for y in 0..buf.area.height {
                for x in 0..buf.area.width {
                    out.push_str(buf.get(x, y).symbol());
                }
                out.push('\n');
            }
            out
        }

        fn names(&self) -> Vec<String> {
            let store = self.session.store();
            let entry = store.find("actives").expect("entry");
            store
                .load(&entry)
                .expect("load")
                .into_iter()
                .map(|contact| contact.name)
                .collect()
        }
    }

    fn keys(codes: &[KeyCode]) -> ScriptedEvents {
        ScriptedEvents::new(codes.iter().map(|code| UiEvent::key(*code)))
    }

    #[test]
    fn send_to_everyone_reports_failures() {
        let mut events = keys(&[KeyCode::Char(' '), KeyCode::Enter, KeyCode::Enter]);
        events.type_text("hi -N");
        events.push(UiEvent::ctrl('d'));
        events.push(UiEvent::key(KeyCode::Enter));
        events.push(UiEvent::key(KeyCode::Char('x')));
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Send).expect("flow");

        assert_eq!(
            harness.sent(),
            vec![
                ("1".to_string(), "hi Ann".to_string()),
                ("2".to_string(), "hi Bay".to_string()),
                ("3".to_string(), "hi Cy".to_string()),
            ]
        );
        let screen = harness.screen();
        assert!(screen.contains("Sent: 2 | Failed: 1"), "{screen}");
        assert!(screen.contains("Failed: Bay Michaels"), "{screen}");
        assert_eq!(harness.session.events().remaining(), 0);
    }

    #[test]
    fn pooled_send_keeps_recipient_order() {
        let mut events = keys(&[KeyCode::Char(' '), KeyCode::Enter, KeyCode::Enter]);
        events.type_text("hey [name]");
        events.push(UiEvent::ctrl('d'));
        events.push(UiEvent::key(KeyCode::Enter));
        events.push(UiEvent::key(KeyCode::Char('x')));
        let mut harness = Harness::with_delivery(events, true, 3);

        harness.session.perform(MenuAction::Send).expect("flow");

        let mut handles: Vec<_> = harness.sent().into_iter().map(|(h, _)| h).collect();
        handles.sort();
        assert_eq!(handles, vec!["1", "2", "3"]);
        let screen = harness.screen();
        assert!(screen.contains("Sent: 2 | Failed: 1"), "{screen}");
    }

    #[test]
    fn typed_names_retry_after_no_match_and_list_unmatched() {
        let mut events = keys(&[
            KeyCode::Char(' '),
            KeyCode::Enter,
            KeyCode::Down,
            KeyCode::Down,
            KeyCode::Enter,
        ]);
        events.type_text("xavier\n");
        events.push(UiEvent::key(KeyCode::Char('x')));
        events.type_text("bay, zed\n");
        events.type_text("yo");
        events.push(UiEvent::ctrl('d'));
        events.push(UiEvent::key(KeyCode::Esc));
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Send).expect("flow");

        assert!(harness.sent().is_empty());
        let screen = harness.screen();
        assert!(screen.contains("Recipients (1): Bay Michaels"), "{screen}");
        assert!(screen.contains("Unmatched (ignored): zed"), "{screen}");
        assert_eq!(harness.session.events().remaining(), 0);
    }

    #[test]
    fn picking_recipients_uses_the_contact_browser() {
        let mut events = keys(&[
            KeyCode::Char(' '),
            KeyCode::Enter,
            KeyCode::Down,
            KeyCode::Enter,
        ]);
        events.type_text("cy");
        events.push(UiEvent::key(KeyCode::Char(' ')));
        events.push(UiEvent::key(KeyCode::Enter));
        events.type_text("ok");
        events.push(UiEvent::ctrl('d'));
        events.push(UiEvent::key(KeyCode::Enter));
        events.push(UiEvent::key(KeyCode::Enter));
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Send).expect("flow");

        assert_eq!(harness.sent(), vec![("3".to_string(), "ok".to_string())]);
    }

    #[test]
    fn missing_script_aborts_before_sending() {
        let mut events = keys(&[KeyCode::Char(' '), KeyCode::Enter, KeyCode::Enter]);
        events.type_text("hi");
        events.push(UiEvent::ctrl('d'));
        events.push(UiEvent::key(KeyCode::Enter));
        events.push(UiEvent::key(KeyCode::Enter));
        let mut harness = Harness::with_delivery(events, false, 1);

        harness.session.perform(MenuAction::Send).expect("flow");

        assert!(harness.sent().is_empty());
        assert!(harness.screen().contains("Missing script"));
    }

    #[test]
    fn missing_roster_shows_notice() {
        let mut events = keys(&[KeyCode::Char(' '), KeyCode::Enter]);
        events.push(UiEvent::key(KeyCode::Char('x')));
        let mut harness = Harness::new(events);
        let ghost = harness.session.store().path_for("actives");
        std::fs::remove_file(&ghost).expect("remove roster");

        harness.session.perform(MenuAction::Send).expect("flow");

        let screen = harness.screen();
        assert!(screen.contains("Missing list"), "{screen}");
        assert!(screen.contains("Roster CSV missing"), "{screen}");
    }

    #[test]
    fn resize_cancels_compose_without_sending() {
        let mut events = keys(&[KeyCode::Char(' '), KeyCode::Enter, KeyCode::Enter]);
        events.type_text("half a thought");
        events.push(UiEvent::Resize(100, 30));
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Send).expect("flow");

        assert!(harness.sent().is_empty());
        assert!(harness.session.is_running());
    }

    #[test]
    fn resize_keeps_picker_state() {
        let mut events = keys(&[KeyCode::Char(' ')]);
        events.push(UiEvent::Resize(80, 24));
        events.push(UiEvent::key(KeyCode::Enter));
        events.push(UiEvent::key(KeyCode::Esc));
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Send).expect("flow");

        let screen = harness.screen();
        assert!(screen.contains("Everyone"), "{screen}");
    }

    #[test]
    fn remove_requires_selection_and_confirmation() {
        let mut events = keys(&[
            KeyCode::Down,
            KeyCode::Down,
            KeyCode::Enter,
            KeyCode::Enter,
            KeyCode::Enter,
            KeyCode::Char('x'),
            KeyCode::Char(' '),
            KeyCode::Enter,
            KeyCode::Enter,
            KeyCode::Char('x'),
            KeyCode::Esc,
        ]);
        events.push_idle();
        let mut harness = Harness::new(events);
        harness.session.perform(MenuAction::Lists).expect("flow");

        assert_eq!(harness.names(), vec!["Bay Michaels", "Cy Young"]);
        assert_eq!(harness.session.events().remaining(), 1);
    }

    #[test]
    fn cancelled_remove_writes_nothing() {
        let events = keys(&[
            KeyCode::Down,
            KeyCode::Down,
            KeyCode::Enter,
            KeyCode::Enter,
            KeyCode::Char(' '),
            KeyCode::Enter,
            KeyCode::Down,
            KeyCode::Enter,
            KeyCode::Esc,
        ]);
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Lists).expect("flow");

        assert_eq!(harness.names().len(), 3);
    }

    #[test]
    fn add_contact_rejects_duplicates_then_adds() {
        let mut events = keys(&[KeyCode::Down, KeyCode::Enter, KeyCode::Enter]);
        events.type_text("Dup\n2\n\n");
        events.push(UiEvent::key(KeyCode::Char('x')));
        events.push(UiEvent::key(KeyCode::Down));
        events.push(UiEvent::key(KeyCode::Enter));
        events.push(UiEvent::key(KeyCode::Enter));
        events.type_text("Dana Cruz\n+1 555 0009\ndc\n");
        events.push(UiEvent::key(KeyCode::Char('x')));
        events.push(UiEvent::key(KeyCode::Esc));
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Lists).expect("flow");

        assert_eq!(
            harness.names(),
            vec!["Ann Lee", "Bay Michaels", "Cy Young", "Dana Cruz"]
        );
    }

    #[test]
    fn add_to_new_list_creates_the_file() {
        let mut events = keys(&[KeyCode::Down, KeyCode::Enter, KeyCode::Down, KeyCode::Enter]);
        events.type_text("pledges\nEli\n7\n\n");
        events.push(UiEvent::key(KeyCode::Char('x')));
        events.push(UiEvent::key(KeyCode::Esc));
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Lists).expect("flow");

        let store = harness.session.store();
        let entry = store.find("pledges").expect("new roster listed");
        assert_eq!(store.load(&entry).expect("load").len(), 1);
    }

    #[test]
    fn landing_loop_runs_actions_until_quit() {
        let mut events = ScriptedEvents::new([UiEvent::key(KeyCode::Char('h'))]);
        events.push(UiEvent::key(KeyCode::Char('x')));
        events.push_idle();
        events.push(UiEvent::key(KeyCode::Char('d')));
        events.push(UiEvent::key(KeyCode::Enter));
        events.push(UiEvent::Resize(80, 24));
        events.push(UiEvent::key(KeyCode::Char('q')));
        let mut harness = Harness::new(events);

        harness.session.run().expect("session");

        assert!(!harness.session.is_running());
        assert_eq!(harness.session.events().remaining(), 0);
    }

    #[test]
    fn ctrl_c_inside_a_flow_ends_the_session() {
        let mut events = ScriptedEvents::new([UiEvent::key(KeyCode::Char('s'))]);
        events.push(UiEvent::ctrl('c'));
        let mut harness = Harness::new(events);

        harness.session.run().expect("session");

        assert!(!harness.session.is_running());
        assert!(harness.sent().is_empty());
    }

    #[test]
    fn placeholders_report_not_implemented() {
        let events = keys(&[KeyCode::Enter]);
        let mut harness = Harness::new(events);

        harness.session.perform(MenuAction::Schedule).expect("flow");

        assert!(harness.screen().contains("This section is not implemented yet."));
    }
}
