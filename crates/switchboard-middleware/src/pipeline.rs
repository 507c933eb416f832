use std::time::{Duration, Instant};

use switchboard_channels::{ChatApi, DeliveryAdapter};
use switchboard_core::config::MiddlewareConfig;
use switchboard_core::{Activity, TurnId, TurnState};
use tracing::{debug, info_span, Instrument};

use crate::context::{Flow, Turn, TurnContext, TurnHandler};
use crate::error::Result;
use crate::sink::DeliverySink;
use crate::stage::{ActivitySink, Chain};
use crate::stages::{DebugStage, FormatStage, TimingStage};

/// `Debug → Timing → Format → DeliverySink`.
pub type StandardChain<A> =
    Chain<DebugStage, Chain<TimingStage, Chain<FormatStage, DeliverySink<A>>>>;

pub fn standard_chain<A: ChatApi>(
    config: &MiddlewareConfig,
    delivery: DeliveryAdapter<A>,
) -> StandardChain<A> {
    Chain::new(
        DebugStage::new(&config.debug_suffix),
        Chain::new(
            TimingStage::new(&config.timing_suffix),
            Chain::new(FormatStage::new(), DeliverySink::new(delivery)),
        ),
    )
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub turn_id: TurnId,
    /// A stage halted the inbound pass; the handler never ran.
    pub halted: bool,
    /// Activities delivered during the turn.
    pub sent: usize,
    pub elapsed: Duration,
}

/// Runs turns through a composed chain.
pub struct Pipeline<C: ActivitySink> {
    chain: C,
    service_url: String,
}

impl<C: ActivitySink> Pipeline<C> {
    /// `service_url` is recorded in every turn's conversation reference.
    pub fn new(chain: C, service_url: impl Into<String>) -> Self {
        Self {
            chain,
            service_url: service_url.into(),
        }
    }

    /// Inbound pass, handler, then the outcome. Outbound activities the
    /// handler sends travel through the chain as they are sent.
    pub async fn run<H>(&self, activity: Activity, state: TurnState, handler: &H) -> Result<TurnOutcome>
    where
        H: TurnHandler + ?Sized,
    {
        let started = Instant::now();
        let mut ctx = TurnContext::new(activity, state, &self.service_url);
        let span = info_span!(
            "turn",
            turn_id = %ctx.turn_id,
            conversation = %ctx.activity.conversation,
            activity_type = %ctx.activity.activity_type,
        );

        async move {
            let flow = self.chain.on_turn(&mut ctx).await?;
            if flow == Flow::Continue {
                let turn = Turn::new(&ctx, &self.chain);
                handler.on_turn(&turn).await?;
            }

            let outcome = TurnOutcome {
                turn_id: ctx.turn_id.clone(),
                halted: flow == Flow::Halt,
                sent: ctx.sent_count(),
                elapsed: started.elapsed(),
            };
            debug!(
                halted = outcome.halted,
                sent = outcome.sent,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "turn finished"
            );
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::stage::Stage;
    use async_trait::async_trait;
    use std::sync::Arc;
    use switchboard_channels::recording::{RecordingChatApi, Scripted};
    use switchboard_channels::{ChannelError, RetryPolicy};
    use switchboard_core::{ChannelAccount, ConversationId};

    struct Echo;

    #[async_trait]
    impl TurnHandler for Echo {
        async fn on_turn(&self, turn: &Turn<'_>) -> Result<()> {
            let text = turn.activity().text_or_empty().to_string();
            turn.reply(text).await?;
            Ok(())
        }
    }

    /// Records what the handler saw.
    struct Capture(std::sync::Mutex<Vec<String>>);

    #[async_trait]
    impl TurnHandler for Capture {
        async fn on_turn(&self, turn: &Turn<'_>) -> Result<()> {
            self.0
                .lock()
                .expect("capture lock")
                .push(turn.activity().text_or_empty().to_string());
            turn.reply("ok").await?;
            Ok(())
        }
    }

    fn pipeline() -> (Pipeline<StandardChain<Arc<RecordingChatApi>>>, Arc<RecordingChatApi>) {
        let api = Arc::new(RecordingChatApi::new());
        let retry = RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
        };
        let chain = standard_chain(
            &MiddlewareConfig::default(),
            DeliveryAdapter::new(Arc::clone(&api), retry),
        );
        (Pipeline::new(chain, "https://slack.com/api"), api)
    }

    fn inbound(text: &str) -> Activity {
        let mut activity = Activity::message(ConversationId::new("C1", Some("1.0")), text);
        activity.from = Some(ChannelAccount::new("U1"));
        activity
    }

    #[tokio::test]
    async fn debug_suffix_is_stripped_and_block_prepended() {
        let (pipeline, api) = pipeline();
        let handler = Capture(std::sync::Mutex::new(Vec::new()));

        let outcome = pipeline
            .run(inbound("status --debug"), TurnState::default(), &handler)
            .await
            .expect("turn");

        assert_eq!(handler.0.lock().expect("lock").as_slice(), ["status"]);
        assert_eq!(outcome.sent, 1);
        let posted = api.posted_texts();
        assert!(posted[0].starts_with("```\nturn: "), "got {:?}", posted[0]);
        assert!(posted[0].contains("\"status --debug\""));
        assert!(posted[0].ends_with("\nok"));
    }

    #[tokio::test]
    async fn plain_turn_is_untouched_apart_from_formatting() {
        let (pipeline, api) = pipeline();
        pipeline
            .run(inbound("**hi** & bye"), TurnState::default(), &Echo)
            .await
            .expect("turn");
        assert_eq!(api.posted_texts(), vec!["*hi* &amp; bye".to_string()]);
    }

    #[tokio::test]
    async fn timing_suffix_appends_elapsed() {
        let (pipeline, api) = pipeline();
        pipeline
            .run(inbound("ping --timing"), TurnState::default(), &Echo)
            .await
            .expect("turn");
        let posted = api.posted_texts();
        assert!(posted[0].starts_with("ping\nelapsed: "), "got {:?}", posted[0]);
        assert!(posted[0].ends_with(" ms"));
    }

    #[tokio::test]
    async fn both_suffixes_are_honoured_in_either_order() {
        for text in ["status --debug --timing", "status --timing --debug"] {
            let (pipeline, api) = pipeline();
            let handler = Capture(std::sync::Mutex::new(Vec::new()));
            let outcome = pipeline
                .run(inbound(text), TurnState::default(), &handler)
                .await
                .expect("turn");

            assert_eq!(handler.0.lock().expect("lock").as_slice(), ["status"], "for {text:?}");
            assert_eq!(outcome.sent, 1);
            let posted = api.posted_texts();
            assert!(posted[0].starts_with("```\nturn: "), "got {:?}", posted[0]);
            assert!(posted[0].ends_with(" ms"), "got {:?}", posted[0]);
        }
    }

    #[tokio::test]
    async fn preset_debug_flag_activates_stage() {
        let (pipeline, api) = pipeline();
        let state = TurnState {
            debug: true,
            ..TurnState::default()
        };
        pipeline.run(inbound("hello"), state, &Echo).await.expect("turn");
        assert!(api.posted_texts()[0].starts_with("```"));
    }

    #[tokio::test]
    async fn delivery_failure_is_reraised() {
        let (pipeline, api) = pipeline();
        api.push(Scripted::Reject("not_in_channel".into()));

        let err = pipeline
            .run(inbound("hi"), TurnState::default(), &Echo)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Delivery(ChannelError::Api { ref error, .. }) if error == "not_in_channel"
        ));
    }

    // Outbound transforms must compose in declared order: the first stage's
    // output is what the second stage sees.
    struct Tag(&'static str);

    #[async_trait]
    impl Stage for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn on_send<N: ActivitySink>(
            &self,
            turn: &TurnContext,
            mut activities: Vec<Activity>,
            next: &N,
        ) -> Result<Vec<switchboard_core::ResourceResponse>> {
            for a in &mut activities {
                a.text = Some(format!("{}({})", self.0, a.text_or_empty()));
            }
            next.send_activities(turn, activities).await
        }
    }

    #[tokio::test]
    async fn outbound_transforms_compose_in_declared_order() {
        let api = Arc::new(RecordingChatApi::new());
        let delivery = DeliveryAdapter::new(
            Arc::clone(&api),
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
            },
        );
        let chain = Chain::new(
            Tag("debug"),
            Chain::new(Tag("diag"), Chain::new(Tag("format"), DeliverySink::new(delivery))),
        );
        let pipeline = Pipeline::new(chain, "https://slack.com/api");

        pipeline
            .run(inbound("x"), TurnState::default(), &Echo)
            .await
            .expect("turn");
        assert_eq!(api.posted_texts(), vec!["format(diag(debug(x)))".to_string()]);
    }

    struct Gate;

    #[async_trait]
    impl Stage for Gate {
        fn name(&self) -> &'static str {
            "gate"
        }

        async fn on_turn(&self, turn: &mut TurnContext) -> Result<Flow> {
            Ok(if turn.activity.text_or_empty() == "blocked" {
                Flow::Halt
            } else {
                Flow::Continue
            })
        }
    }

    #[tokio::test]
    async fn halted_turn_skips_handler() {
        let api = Arc::new(RecordingChatApi::new());
        let delivery = DeliveryAdapter::new(
            Arc::clone(&api),
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
            },
        );
        let pipeline = Pipeline::new(Chain::new(Gate, DeliverySink::new(delivery)), "https://slack.com/api");

        let outcome = pipeline
            .run(inbound("blocked"), TurnState::default(), &Echo)
            .await
            .expect("turn");
        assert!(outcome.halted);
        assert_eq!(outcome.sent, 0);
        assert!(api.calls().is_empty());
    }
}
