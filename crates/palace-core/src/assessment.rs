//! Questionnaire submission: score a complete answer set and persist it on the profile.

use crate::error::PalaceResult;
use crate::record_store::RecordStore;
use crate::records::Profile;
use crate::vark::{score_complete, AnswerSet, VarkResult};
use chrono::Utc;

/// Score `answers` against a questionnaire of `total_questions` and store the result
/// on the user's profile (the four counters, `learning_style`, `test_completed`).
///
/// An incomplete set fails with `IncompleteAnswers` before the store is touched.
pub fn submit_answers(
    store: &RecordStore,
    user_id: &str,
    answers: &AnswerSet,
    total_questions: usize,
) -> PalaceResult<(VarkResult, Profile)> {
    let result = score_complete(answers, total_questions)?;

    let mut profile = store.ensure_profile(user_id)?;
    profile.vark_visual = Some(result.scores.visual);
    profile.vark_auditory = Some(result.scores.auditory);
    profile.vark_reading = Some(result.scores.reading);
    profile.vark_kinesthetic = Some(result.scores.kinesthetic);
    profile.learning_style = Some(result.dominant);
    profile.test_completed = Some(true);
    profile.updated_at = Some(Utc::now());
    store.upsert_profile(&profile)?;

    tracing::info!(
        target: "palace::vark",
        user_id,
        dominant = %result.dominant,
        "Questionnaire submitted"
    );
    Ok((result, profile))
}
