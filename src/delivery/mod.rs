use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::contacts::Contact;
use crate::message::personalize;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Delivery script missing: {}", .0.display())]
    MissingScript(PathBuf),
}

/// Result of one send: `detail` is free-form text for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub ok: bool,
    pub detail: String,
}

impl DeliveryOutcome {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

pub trait Delivery: Send + Sync {
    /// Verifies the backend can send at all before any recipient is tried.
    fn check_ready(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    fn send(&self, handle: &str, text: &str) -> DeliveryOutcome;
}

/// Sends by running `<program> <script> <handle> <text>`.
#[derive(Debug, Clone)]
pub struct ScriptDelivery {
    program: String,
    script: PathBuf,
}

impl ScriptDelivery {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
        }
    }
}

impl Delivery for ScriptDelivery {
    fn check_ready(&self) -> Result<(), DeliveryError> {
        if self.script.is_file() {
            Ok(())
        } else {
            Err(DeliveryError::MissingScript(self.script.clone()))
        }
    }

    fn send(&self, handle: &str, text: &str) -> DeliveryOutcome {
        let output = Command::new(&self.program)
            .arg(&self.script)
            .arg(handle)
            .arg(text)
            .output();
        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = if stdout.trim().is_empty() {
                    stderr.trim().to_string()
                } else {
                    stdout.trim().to_string()
                };
                if !output.status.success() {
                    tracing::warn!(%handle, status = ?output.status, %detail, "delivery failed");
                }
                DeliveryOutcome {
                    ok: output.status.success(),
                    detail,
                }
            }
            Err(err) => {
                tracing::error!(?err, program = %self.program, "failed to launch delivery program");
                DeliveryOutcome::failed(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOutcome {
    pub name: String,
    pub number: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone)]
pub enum DispatchEvent<'a> {
    Started { index: usize, contact: &'a Contact },
    Finished { index: usize, result: &'a RecipientOutcome },
}

/// Per-recipient outcomes in recipient order.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub outcomes: Vec<RecipientOutcome>,
    pub finished_at: OffsetDateTime,
}

impl DispatchReport {
    fn new(outcomes: Vec<RecipientOutcome>) -> Self {
        Self {
            outcomes,
            finished_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }

    /// Wall-clock finish time, `HH:MM:SS UTC`.
    pub fn finished_clock(&self) -> String {
        let format = format_description!("[hour]:[minute]:[second]");
        self.finished_at
            .format(&format)
            .map(|clock| format!("{clock} UTC"))
            .unwrap_or_else(|_| self.finished_at.to_string())
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.outcome.ok)
            .map(|o| o.name.as_str())
            .collect()
    }
}

fn deliver(delivery: &dyn Delivery, contact: &Contact, template: &str) -> RecipientOutcome {
    let text = personalize(template, &contact.first);
    RecipientOutcome {
        name: contact.name.clone(),
        number: contact.number.clone(),
        outcome: delivery.send(&contact.number, &text),
    }
}

/// Sends to every recipient in order, pausing between sends. Failures are
/// recorded and never stop the loop.
pub fn dispatch<F>(
    recipients: &[Contact],
    template: &str,
    delivery: &dyn Delivery,
    pause: Duration,
    mut observer: F,
) -> DispatchReport
where
    F: FnMut(DispatchEvent<'_>),
{
    let mut outcomes = Vec::with_capacity(recipients.len());
    for (index, contact) in recipients.iter().enumerate() {
        observer(DispatchEvent::Started { index, contact });
        let result = deliver(delivery, contact, template);
        observer(DispatchEvent::Finished {
            index,
            result: &result,
        });
        outcomes.push(result);
        if !pause.is_zero() && index + 1 < recipients.len() {
            thread::sleep(pause);
        }
    }
    let report = DispatchReport::new(outcomes);
    tracing::info!(
        sent = report.sent(),
        failed = report.failed(),
        finished = %report.finished_clock(),
        "dispatch finished"
    );
    report
}

/// Sends through at most `workers` threads. Outcomes are still reported in
/// recipient order.
pub fn dispatch_pool(
    recipients: &[Contact],
    template: &str,
    delivery: &dyn Delivery,
    workers: usize,
) -> DispatchReport {
    let workers = workers.clamp(1, recipients.len().max(1));
    let (job_tx, job_rx) = bounded::<(usize, &Contact)>(workers);
    let (done_tx, done_rx) = bounded::<(usize, RecipientOutcome)>(recipients.len().max(1));

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move || {
                for (index, contact) in job_rx.iter() {
                    if done_tx.send((index, deliver(delivery, contact, template))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(done_tx);
        for job in recipients.iter().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);
    });

    let mut slots: Vec<Option<RecipientOutcome>> = vec![None; recipients.len()];
    for (index, outcome) in done_rx.try_iter() {
        slots[index] = Some(outcome);
    }
    let outcomes = slots.into_iter().flatten().collect();
    let report = DispatchReport::new(outcomes);
    tracing::info!(
        sent = report.sent(),
        failed = report.failed(),
        workers,
        finished = %report.finished_clock(),
        "pooled dispatch finished"
    );
    report
}
