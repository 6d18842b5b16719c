use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::exam_dto::SubmitAnswersRequest;
use crate::error::{Error, Result};
use crate::models::exam::Exam;
use crate::models::question::Question;
use crate::models::result::ExamResult;
use crate::results::ResultsView;
use crate::services::events::{ErrorKind, EventSink};
use crate::services::gateway::ExamGateway;

pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress,
    Submitting,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock decremented, time remains.
    Running,
    /// Clock just hit zero: the caller must fire the auto-submit. Reported
    /// exactly once per attempt.
    Expired,
    /// Nothing to do (not in progress, or already at zero).
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Result stored, session is `Completed`.
    Completed,
    /// A submission was already in flight or the session had ended.
    Ignored,
    /// The response belonged to an earlier attempt and was discarded.
    Stale,
}

/// Client-local state of one exam-taking session. Never persisted; the only
/// durable effect is the submit call to the scoring endpoint.
pub struct DeliverySession {
    exam: Exam,
    exam_id: Uuid,
    answers: HashMap<Uuid, String>,
    time_left_seconds: u32,
    total_seconds: u32,
    current_index: usize,
    phase: SessionPhase,
    /// Bumped on retake and close; responses carrying an older value are
    /// discarded instead of applied.
    attempt: u64,
    result: Option<ExamResult>,
    gateway: Arc<dyn ExamGateway>,
    sink: Arc<dyn EventSink>,
}

impl DeliverySession {
    pub fn new(
        exam: Exam,
        seconds_per_question: u32,
        gateway: Arc<dyn ExamGateway>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let exam_id = exam
            .id
            .ok_or_else(|| Error::InvalidState("cannot deliver an unsaved exam".to_string()))?;
        if exam.questions.is_empty() {
            return Err(Error::InvalidState(
                "cannot deliver an exam without questions".to_string(),
            ));
        }

        let total_seconds = exam.questions.len() as u32 * seconds_per_question;
        Ok(Self {
            exam,
            exam_id,
            answers: HashMap::new(),
            time_left_seconds: total_seconds,
            total_seconds,
            current_index: 0,
            phase: SessionPhase::InProgress,
            attempt: 0,
            result: None,
            gateway,
            sink,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn time_left_seconds(&self) -> u32 {
        self.time_left_seconds
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.exam.questions[self.current_index]
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn answers(&self) -> &HashMap<Uuid, String> {
        &self.answers
    }

    pub fn answer(&self, question_id: Uuid) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn progress(&self) -> f64 {
        self.answers.len() as f64 / self.exam.questions.len() as f64
    }

    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    /// Review rows for the results screen, once a result has been received.
    pub fn results_view(&self) -> Option<ResultsView> {
        self.result
            .as_ref()
            .map(|result| ResultsView::new(&self.exam, result))
    }

    /// Idempotent upsert of the current answer. Ignored once submission has
    /// begun, so a late keystroke cannot change a submitted answer set.
    pub fn record_answer(&mut self, question_id: Uuid, value: impl Into<String>) {
        if self.phase != SessionPhase::InProgress {
            return;
        }
        self.answers.insert(question_id, value.into());
    }

    /// Pure navigation; clamped, no effect on answers or the clock.
    pub fn navigate(&mut self, index: usize) {
        self.current_index = index.min(self.exam.questions.len() - 1);
    }

    /// One second of countdown. Returns `Expired` exactly once, on the tick
    /// that reaches zero; the caller is responsible for firing the
    /// auto-submit then.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::InProgress || self.time_left_seconds == 0 {
            return TickOutcome::Idle;
        }
        self.time_left_seconds -= 1;
        if self.time_left_seconds == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running
        }
    }

    /// Full reset back to the start of delivery: empty answers, full clock,
    /// first question. Only meaningful from `Completed`.
    pub fn retake(&mut self) {
        if self.phase != SessionPhase::Completed {
            return;
        }
        self.answers.clear();
        self.time_left_seconds = self.total_seconds;
        self.current_index = 0;
        self.result = None;
        self.attempt += 1;
        self.phase = SessionPhase::InProgress;
        info!("Session reset for retake, attempt {}", self.attempt);
    }

    /// Abandons the session (modal closed, user navigated away). The session
    /// ends and an in-flight submit response, if any, is discarded when it
    /// arrives.
    pub fn close(&mut self) {
        self.attempt += 1;
        self.phase = SessionPhase::Completed;
    }

    /// Sends the recorded answers to the scoring endpoint. The phase guard
    /// admits only the first caller while a submission is in flight, so a
    /// manual submit racing the timeout cannot fire twice. On failure the
    /// session reopens with the answer set intact; there is no retry.
    ///
    /// The lock is released while the request is in flight; the attempt
    /// counter decides whether the response still applies when it returns.
    pub async fn submit(
        session: &Arc<Mutex<DeliverySession>>,
        trigger: SubmitTrigger,
    ) -> Result<SubmitOutcome> {
        let (gateway, sink, exam_id, payload, attempt) = {
            let mut s = session.lock().await;
            if s.phase != SessionPhase::InProgress {
                return Ok(SubmitOutcome::Ignored);
            }
            s.phase = SessionPhase::Submitting;
            (
                s.gateway.clone(),
                s.sink.clone(),
                s.exam_id,
                SubmitAnswersRequest {
                    answers: s.answers.clone(),
                },
                s.attempt,
            )
        };

        let outcome = gateway.submit_answers(exam_id, payload).await;

        let mut s = session.lock().await;
        if s.attempt != attempt {
            info!("Discarding submit response for stale attempt {}", attempt);
            return Ok(SubmitOutcome::Stale);
        }

        match outcome {
            Ok(result) => {
                s.result = Some(result);
                s.phase = SessionPhase::Completed;
                sink.notify_success("Exam submitted");
                Ok(SubmitOutcome::Completed)
            }
            Err(err) => {
                s.phase = SessionPhase::InProgress;
                let kind = match trigger {
                    SubmitTrigger::Manual => ErrorKind::RequestFailed,
                    SubmitTrigger::Timeout => ErrorKind::TimeoutAutoSubmit,
                };
                sink.notify_error(kind, &format!("Failed to submit exam: {}", err));
                Err(err)
            }
        }
    }
}

/// Drives the one-second countdown of a session. The task ends on its own
/// once the session completes, and is aborted on `stop()` or drop, so a
/// stray tick can never submit against a finished session.
pub struct SessionTimer {
    handle: JoinHandle<()>,
}

impl SessionTimer {
    pub fn spawn(session: Arc<Mutex<DeliverySession>>) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let outcome = session.lock().await.tick();
                match outcome {
                    TickOutcome::Expired => {
                        info!("Time is up, auto-submitting");
                        if let Err(err) =
                            DeliverySession::submit(&session, SubmitTrigger::Timeout).await
                        {
                            warn!("Auto-submit on timeout failed: {}", err);
                        }
                    }
                    TickOutcome::Idle => {
                        if session.lock().await.phase() == SessionPhase::Completed {
                            break;
                        }
                    }
                    TickOutcome::Running => {}
                }
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;
    use crate::models::result::QuestionResult;
    use crate::services::gateway::MockExamGateway;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingSink {
        successes: StdMutex<Vec<String>>,
        errors: StdMutex<Vec<(ErrorKind, String)>>,
    }

    impl EventSink for RecordingSink {
        fn notify_success(&self, message: &str) {
            self.successes.lock().unwrap().push(message.to_string());
        }

        fn notify_error(&self, kind: ErrorKind, message: &str) {
            self.errors.lock().unwrap().push((kind, message.to_string()));
        }
    }

    fn exam_with(n: usize) -> Exam {
        Exam {
            id: Some(Uuid::new_v4()),
            title: "Quiz".to_string(),
            subject: "General".to_string(),
            questions: (0..n)
                .map(|i| Question {
                    id: Uuid::new_v4(),
                    question_type: QuestionType::ShortAnswer,
                    question_text: format!("Question {}", i + 1),
                    options: Vec::new(),
                    correct_answer: "yes".to_string(),
                })
                .collect(),
            created_at: None,
        }
    }

    fn result_for(exam: &Exam, score: u32) -> ExamResult {
        ExamResult {
            score,
            total: exam.questions.len() as u32,
            results: exam
                .questions
                .iter()
                .map(|q| QuestionResult {
                    question_id: q.id,
                    user_answer: "yes".to_string(),
                    is_correct: true,
                    feedback: String::new(),
                })
                .collect(),
        }
    }

    fn session_with(
        exam: Exam,
        gateway: impl ExamGateway + 'static,
    ) -> (Arc<Mutex<DeliverySession>>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let session = DeliverySession::new(
            exam,
            DEFAULT_SECONDS_PER_QUESTION,
            Arc::new(gateway),
            sink.clone(),
        )
        .unwrap();
        (Arc::new(Mutex::new(session)), sink)
    }

    #[test]
    fn clock_initializes_to_a_minute_per_question() {
        let sink = Arc::new(RecordingSink::default());
        let session = DeliverySession::new(
            exam_with(3),
            DEFAULT_SECONDS_PER_QUESTION,
            Arc::new(MockExamGateway::new()),
            sink,
        )
        .unwrap();
        assert_eq!(session.time_left_seconds(), 180);
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn rejects_unsaved_or_empty_exams() {
        let sink = Arc::new(RecordingSink::default());
        let mut unsaved = exam_with(2);
        unsaved.id = None;
        assert!(DeliverySession::new(
            unsaved,
            60,
            Arc::new(MockExamGateway::new()),
            sink.clone()
        )
        .is_err());

        let mut empty = exam_with(1);
        empty.questions.clear();
        assert!(DeliverySession::new(empty, 60, Arc::new(MockExamGateway::new()), sink).is_err());
    }

    #[test]
    fn navigation_clamps_and_leaves_answers_alone() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = DeliverySession::new(
            exam_with(3),
            60,
            Arc::new(MockExamGateway::new()),
            sink,
        )
        .unwrap();
        let qid = session.exam().questions[0].id;
        session.record_answer(qid, "Paris");

        session.navigate(99);
        assert_eq!(session.current_index(), 2);
        session.navigate(0);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.answer(qid), Some("Paris"));
        assert_eq!(session.time_left_seconds(), 180);
    }

    #[test]
    fn countdown_expires_exactly_once() {
        let sink = Arc::new(RecordingSink::default());
        let mut session =
            DeliverySession::new(exam_with(2), 60, Arc::new(MockExamGateway::new()), sink).unwrap();

        let mut expired = 0;
        for _ in 0..120 {
            if session.tick() == TickOutcome::Expired {
                expired += 1;
            }
        }
        assert_eq!(expired, 1);
        assert_eq!(session.time_left_seconds(), 0);
        // the clock stays at zero, no further expiry
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.tick(), TickOutcome::Idle);
    }

    #[tokio::test]
    async fn manual_submit_completes_and_stores_result() {
        let exam = exam_with(2);
        let expected = result_for(&exam, 2);
        let response = expected.clone();

        let mut gateway = MockExamGateway::new();
        gateway
            .expect_submit_answers()
            .times(1)
            .returning(move |_, _| Ok(response.clone()));

        let (session, sink) = session_with(exam, gateway);
        {
            let mut s = session.lock().await;
            let qid = s.exam().questions[0].id;
            s.record_answer(qid, "yes");
        }

        let outcome = DeliverySession::submit(&session, SubmitTrigger::Manual)
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Completed);

        let s = session.lock().await;
        assert_eq!(s.phase(), SessionPhase::Completed);
        assert_eq!(s.result(), Some(&expected));
        assert_eq!(sink.successes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_submit_is_ignored_not_doubled() {
        let exam = exam_with(1);
        let response = result_for(&exam, 1);

        let mut gateway = MockExamGateway::new();
        gateway
            .expect_submit_answers()
            .times(1)
            .returning(move |_, _| Ok(response.clone()));

        let (session, _) = session_with(exam, gateway);

        // the final tick expires the clock, then manual submit wins the race
        {
            let mut s = session.lock().await;
            while s.tick() != TickOutcome::Expired {}
        }
        let first = DeliverySession::submit(&session, SubmitTrigger::Manual)
            .await
            .unwrap();
        assert_eq!(first, SubmitOutcome::Completed);

        // the timeout-triggered submit arrives second and must not re-fire
        let second = DeliverySession::submit(&session, SubmitTrigger::Timeout)
            .await
            .unwrap();
        assert_eq!(second, SubmitOutcome::Ignored);
    }

    #[tokio::test]
    async fn failed_submit_reopens_session_with_answers_intact() {
        let exam = exam_with(2);
        let qid = exam.questions[0].id;

        let mut gateway = MockExamGateway::new();
        gateway.expect_submit_answers().times(1).returning(|_, _| {
            Err(Error::RequestFailed {
                status: 500,
                body: "scoring unavailable".to_string(),
            })
        });

        let (session, sink) = session_with(exam, gateway);
        session.lock().await.record_answer(qid, "first try");

        let err = DeliverySession::submit(&session, SubmitTrigger::Timeout)
            .await
            .unwrap_err();
        assert!(err.is_request_failure());

        let s = session.lock().await;
        assert_eq!(s.phase(), SessionPhase::InProgress);
        assert_eq!(s.answer(qid), Some("first try"));
        let errors = sink.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, ErrorKind::TimeoutAutoSubmit);
    }

    #[tokio::test]
    async fn retake_resets_everything_and_bumps_attempt() {
        let exam = exam_with(3);
        let response = result_for(&exam, 1);
        let qid = exam.questions[1].id;

        let mut gateway = MockExamGateway::new();
        gateway
            .expect_submit_answers()
            .returning(move |_, _| Ok(response.clone()));

        let (session, _) = session_with(exam, gateway);
        {
            let mut s = session.lock().await;
            s.record_answer(qid, "something");
            s.navigate(2);
            s.tick();
            s.tick();
        }
        DeliverySession::submit(&session, SubmitTrigger::Manual)
            .await
            .unwrap();

        let mut s = session.lock().await;
        assert_eq!(s.phase(), SessionPhase::Completed);
        s.retake();
        assert_eq!(s.phase(), SessionPhase::InProgress);
        assert!(s.answers().is_empty());
        assert_eq!(s.time_left_seconds(), 180);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.attempt(), 1);
        assert!(s.result().is_none());
    }

    #[test]
    fn retake_is_a_noop_while_in_progress() {
        let sink = Arc::new(RecordingSink::default());
        let mut session =
            DeliverySession::new(exam_with(1), 60, Arc::new(MockExamGateway::new()), sink).unwrap();
        let qid = session.exam().questions[0].id;
        session.record_answer(qid, "kept");
        session.retake();
        assert_eq!(session.answer(qid), Some("kept"));
    }

    /// Gateway that parks the submit call until the test releases it.
    struct GatedGateway {
        started: Arc<Notify>,
        release: Arc<Notify>,
        result: ExamResult,
    }

    #[async_trait]
    impl ExamGateway for GatedGateway {
        async fn fetch_exam(&self, _exam_id: Uuid) -> Result<Exam> {
            unimplemented!()
        }

        async fn create_exam(
            &self,
            _payload: crate::dto::exam_dto::SaveExamRequest,
        ) -> Result<Exam> {
            unimplemented!()
        }

        async fn update_exam(
            &self,
            _exam_id: Uuid,
            _payload: crate::dto::exam_dto::SaveExamRequest,
        ) -> Result<Exam> {
            unimplemented!()
        }

        async fn submit_answers(
            &self,
            _exam_id: Uuid,
            _payload: SubmitAnswersRequest,
        ) -> Result<ExamResult> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(self.result.clone())
        }

        async fn generate_exam(
            &self,
            _payload: crate::dto::exam_dto::GenerateExamRequest,
        ) -> Result<Exam> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn response_after_close_is_discarded() {
        let exam = exam_with(1);
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gateway = GatedGateway {
            started: started.clone(),
            release: release.clone(),
            result: result_for(&exam, 1),
        };

        let (session, _) = session_with(exam, gateway);

        let submit_session = session.clone();
        let submit = tokio::spawn(async move {
            DeliverySession::submit(&submit_session, SubmitTrigger::Manual).await
        });

        // wait for the request to be in flight, then abandon the session
        started.notified().await;
        session.lock().await.close();
        release.notify_one();

        let outcome = submit.await.unwrap().unwrap();
        assert_eq!(outcome, SubmitOutcome::Stale);
        assert!(session.lock().await.result().is_none());
    }
}
