use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    error::SendError,
    payload::{ForwardedContent, Recipient},
    platform::RecipientSender,
};

/// Wait between two recipients; keeps a batch under the platform's DM rate
/// limit.
pub const DEFAULT_PACE: Duration = Duration::from_millis(500);

/// Upper bound for a single send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one fan-out. `succeeded + failed.len()` always equals the
/// number of recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub succeeded: usize,
    /// Display names of failed recipients, in the order they failed.
    pub failed: Vec<String>,
}

impl DispatchResult {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    /// `"{verb} to 3/4 members\nFailed: bob"`.
    pub fn summary(&self, verb: &str) -> String {
        let mut status = format!("{verb} to {}/{} members", self.succeeded, self.total());
        if !self.failed.is_empty() {
            status.push_str("\nFailed: ");
            status.push_str(&self.failed.join(", "));
        }
        status
    }
}

/// Sequential, paced delivery of the same content to many recipients.
#[derive(Debug, Clone, Copy)]
pub struct FanoutDispatcher {
    pace: Duration,
    send_timeout: Duration,
}

impl Default for FanoutDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_PACE, DEFAULT_SEND_TIMEOUT)
    }
}

impl FanoutDispatcher {
    pub fn new(pace: Duration, send_timeout: Duration) -> Self {
        Self { pace, send_timeout }
    }

    pub fn pace(&self) -> Duration {
        self.pace
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Deliver `content` to every recipient in order.
    ///
    /// A failing recipient is recorded and the loop moves on. With more than
    /// one recipient, every attempt is followed by a `pace` wait.
    pub async fn dispatch(
        &self,
        content: &ForwardedContent,
        recipients: &[Recipient],
        sender: &dyn RecipientSender,
    ) -> DispatchResult {
        let outcomes = self.dispatch_each(content, recipients, sender).await;

        let mut result = DispatchResult::default();
        for (recipient, outcome) in recipients.iter().zip(&outcomes) {
            match outcome {
                Ok(()) => result.succeeded += 1,
                Err(_) => result.failed.push(recipient.name.clone()),
            }
        }

        info!(
            total = recipients.len(),
            succeeded = result.succeeded,
            failed = result.failed.len(),
            "fan-out finished"
        );
        result
    }

    /// Same paced loop as [`dispatch`](Self::dispatch), returning one outcome
    /// per recipient in input order.
    pub async fn dispatch_each(
        &self,
        content: &ForwardedContent,
        recipients: &[Recipient],
        sender: &dyn RecipientSender,
    ) -> Vec<Result<(), SendError>> {
        let paced = recipients.len() > 1;
        let mut outcomes = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            let outcome = self.deliver(content, recipient, sender).await;
            match &outcome {
                Ok(()) => debug!(
                    recipient_id = recipient.id,
                    recipient = %recipient.name,
                    "direct message delivered"
                ),
                Err(e) => warn!(
                    recipient_id = recipient.id,
                    recipient = %recipient.name,
                    retryable = e.is_retryable(),
                    error = %e,
                    "direct message failed"
                ),
            }
            outcomes.push(outcome);

            if paced {
                tokio::time::sleep(self.pace).await;
            }
        }

        outcomes
    }

    /// Deliver every part of `content` to one recipient, stopping at the
    /// first failure. Parts already sent stay sent.
    pub async fn deliver(
        &self,
        content: &ForwardedContent,
        recipient: &Recipient,
        sender: &dyn RecipientSender,
    ) -> Result<(), SendError> {
        for payload in content.parts() {
            tokio::time::timeout(self.send_timeout, sender.send(recipient, payload))
                .await
                .map_err(|_| SendError::Timeout(self.send_timeout))??;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::payload::{Payload, RichBlock, SourceMessage},
        async_trait::async_trait,
        std::sync::Mutex,
        tokio::time::Instant,
    };

    /// Records every send; fails sends to recipients listed in `fail_for`,
    /// optionally only on a given part index.
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(u64, Payload)>>,
        fail_for: Vec<u64>,
        fail_on_part: Option<usize>,
        hang_for: Vec<u64>,
    }

    impl RecordingSender {
        fn failing(ids: &[u64]) -> Self {
            Self {
                fail_for: ids.to_vec(),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<(u64, Payload)> {
            self.sent.lock().unwrap().clone()
        }

        fn attempted_ids(&self) -> Vec<u64> {
            let mut ids: Vec<u64> = self.sent().into_iter().map(|(id, _)| id).collect();
            ids.dedup();
            ids
        }
    }

    #[async_trait]
    impl RecipientSender for RecordingSender {
        async fn send(&self, recipient: &Recipient, payload: &Payload) -> Result<(), SendError> {
            let part = {
                let mut sent = self.sent.lock().unwrap();
                let part = sent.iter().filter(|(id, _)| *id == recipient.id).count();
                sent.push((recipient.id, payload.clone()));
                part
            };
            if self.hang_for.contains(&recipient.id) {
                std::future::pending::<()>().await;
            }
            let part_matches = self.fail_on_part.is_none_or(|p| p == part);
            if self.fail_for.contains(&recipient.id) && part_matches {
                return Err(SendError::RecipientUnreachable("dms closed".into()));
            }
            Ok(())
        }
    }

    fn recipients(n: u64) -> Vec<Recipient> {
        (1..=n)
            .map(|i| Recipient::new(i, format!("recipient{i}")))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn second_failure_does_not_abort_batch() {
        let sender = RecordingSender::failing(&[2]);
        let result = FanoutDispatcher::default()
            .dispatch(&ForwardedContent::text("hi"), &recipients(3), &sender)
            .await;
        assert_eq!(result, DispatchResult {
            succeeded: 2,
            failed: vec!["recipient2".into()],
        });
        assert_eq!(sender.attempted_ids(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_always_add_up() {
        for n in 0..6 {
            let sender = RecordingSender::failing(&[1, 4]);
            let list = recipients(n);
            let result = FanoutDispatcher::default()
                .dispatch(&ForwardedContent::text("hi"), &list, &sender)
                .await;
            assert_eq!(result.succeeded + result.failed.len(), list.len());
            assert_eq!(result.total(), list.len());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_recipient_list_sends_and_waits_nothing() {
        let sender = RecordingSender::default();
        let start = Instant::now();
        let result = FanoutDispatcher::default()
            .dispatch(&ForwardedContent::text("hi"), &[], &sender)
            .await;
        assert_eq!(result, DispatchResult::default());
        assert!(sender.sent().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn paces_after_every_recipient_including_failures() {
        let sender = RecordingSender::failing(&[2]);
        let dispatcher = FanoutDispatcher::new(Duration::from_millis(500), DEFAULT_SEND_TIMEOUT);
        let start = Instant::now();
        dispatcher
            .dispatch(&ForwardedContent::text("hi"), &recipients(3), &sender)
            .await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1_500), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(2_000), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn single_recipient_is_not_paced() {
        let sender = RecordingSender::default();
        let start = Instant::now();
        let result = FanoutDispatcher::default()
            .dispatch(&ForwardedContent::text("hi"), &recipients(1), &sender)
            .await;
        assert_eq!(result.succeeded, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicates_are_each_attempted() {
        let sender = RecordingSender::default();
        let list = vec![Recipient::new(7, "dup"), Recipient::new(7, "dup")];
        let result = FanoutDispatcher::default()
            .dispatch(&ForwardedContent::text("hi"), &list, &sender)
            .await;
        assert_eq!(result.succeeded, 2);
        assert_eq!(sender.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_send_times_out_as_failure() {
        let sender = RecordingSender {
            hang_for: vec![1],
            ..Default::default()
        };
        let dispatcher = FanoutDispatcher::new(Duration::ZERO, Duration::from_secs(2));
        let result = dispatcher
            .dispatch(&ForwardedContent::text("hi"), &recipients(2), &sender)
            .await;
        assert_eq!(result, DispatchResult {
            succeeded: 1,
            failed: vec!["recipient1".into()],
        });
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_reports_timeout() {
        let sender = RecordingSender {
            hang_for: vec![1],
            ..Default::default()
        };
        let dispatcher = FanoutDispatcher::new(Duration::ZERO, Duration::from_secs(2));
        let err = dispatcher
            .deliver(&ForwardedContent::text("hi"), &recipients(1)[0], &sender)
            .await
            .unwrap_err();
        assert_eq!(err, SendError::Timeout(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_delivery_marks_recipient_failed() {
        let sender = RecordingSender {
            fail_for: vec![1],
            fail_on_part: Some(1),
            ..Default::default()
        };
        let source = SourceMessage {
            content: "body".into(),
            rich_blocks: vec![RichBlock::default()],
            attachment_urls: vec!["https://cdn/x.png".into()],
        };
        let result = FanoutDispatcher::default()
            .dispatch(&ForwardedContent::from_source(&source), &recipients(2), &sender)
            .await;
        assert_eq!(result.failed, vec!["recipient1".to_string()]);
        assert_eq!(result.succeeded, 1);
        // Recipient 1 got the rich block, failed on the text, never got the attachment.
        let first: Vec<Payload> = sender
            .sent()
            .into_iter()
            .filter(|(id, _)| *id == 1)
            .map(|(_, p)| p)
            .collect();
        assert_eq!(first, vec![
            Payload::Rich(RichBlock::default()),
            Payload::Text("body".into()),
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_each_reports_outcomes_in_recipient_order() {
        let sender = RecordingSender::failing(&[1, 3]);
        let outcomes = FanoutDispatcher::default()
            .dispatch_each(&ForwardedContent::text("hi"), &recipients(3), &sender)
            .await;
        let delivered: Vec<bool> = outcomes.iter().map(Result::is_ok).collect();
        assert_eq!(delivered, vec![false, true, false]);
        assert_eq!(
            outcomes[0],
            Err(SendError::RecipientUnreachable("dms closed".into()))
        );
    }

    #[test]
    fn summary_formatting() {
        let ok = DispatchResult {
            succeeded: 3,
            failed: vec![],
        };
        assert_eq!(ok.summary("Sent"), "Sent to 3/3 members");

        let partial = DispatchResult {
            succeeded: 1,
            failed: vec!["bob".into(), "carol".into()],
        };
        assert_eq!(
            partial.summary("Forwarded"),
            "Forwarded to 1/3 members\nFailed: bob, carol"
        );
    }
}
