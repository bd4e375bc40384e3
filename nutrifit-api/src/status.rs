//! Closed enumerations stored as short codes, and the lifecycle rules for the
//! entities that have one (bonds, appointments, workout and exercise sessions).

use nutrifit_shared::coded_enum;
use nutrifit_shared::errors::{AppError, ErrorCode};

coded_enum! {
    pub enum Sex {
        Male => "M",
        Female => "F",
        Other => "O",
    }
}

coded_enum! {
    pub enum BondStatus {
        Pending => "P",
        Accepted => "A",
        Rejected => "R",
        Cancelled => "C",
    }
}

coded_enum! {
    pub enum AppointmentStatus {
        Pending => "P",
        Accepted => "A",
        Rejected => "R",
        Cancelled => "C",
    }
}

coded_enum! {
    pub enum AppointmentType {
        Presential => "P",
        Online => "O",
    }
}

coded_enum! {
    pub enum RoutineGoal {
        Hypertrophy => "H",
        WeightLoss => "W",
        Strength => "S",
        Endurance => "E",
        Maintenance => "M",
    }
}

coded_enum! {
    pub enum Difficulty {
        Beginner => "B",
        Intermediate => "I",
        Advanced => "A",
    }
}

coded_enum! {
    pub enum WorkoutSessionStatus {
        InProgress => "IP",
        Completed => "C",
        Cancelled => "CA",
    }
}

coded_enum! {
    pub enum ExerciseSessionStatus {
        NotStarted => "NS",
        InProgress => "IP",
        Completed => "C",
        Skipped => "SK",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move {entity} from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        let code = match err.entity {
            "bond" => ErrorCode::InvalidBondTransition,
            "appointment" => ErrorCode::InvalidAppointmentTransition,
            "workout session" => ErrorCode::InvalidWorkoutTransition,
            _ => ErrorCode::InvalidExerciseTransition,
        };
        AppError::with_details(
            code,
            err.to_string(),
            serde_json::json!({ "from": err.from, "to": err.to }),
        )
    }
}

/// Who is asking for a bond or appointment transition, relative to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The party that created the record.
    Sender,
    /// The other party.
    Recipient,
}

impl BondStatus {
    /// `P -> A | R` by the recipient, `P -> C` by the sender (withdrawal),
    /// `A -> C` by either party.
    pub fn transition(self, next: BondStatus, actor: Actor) -> Result<BondStatus, TransitionError> {
        use BondStatus::*;
        let allowed = match (self, next) {
            (Pending, Accepted) | (Pending, Rejected) => actor == Actor::Recipient,
            (Pending, Cancelled) => actor == Actor::Sender,
            (Accepted, Cancelled) => true,
            _ => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(TransitionError { entity: "bond", from: self.code(), to: next.code() })
        }
    }

    /// Pending or accepted bonds block a second bond between the same pair.
    pub fn is_active(&self) -> bool {
        matches!(self, BondStatus::Pending | BondStatus::Accepted)
    }
}

impl AppointmentStatus {
    /// `P -> A | R` by the recipient; any non-cancelled state `-> C` by either party.
    pub fn transition(
        self,
        next: AppointmentStatus,
        actor: Actor,
    ) -> Result<AppointmentStatus, TransitionError> {
        use AppointmentStatus::*;
        let allowed = match (self, next) {
            (Pending, Accepted) | (Pending, Rejected) => actor == Actor::Recipient,
            (Cancelled, Cancelled) => false,
            (_, Cancelled) => true,
            _ => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(TransitionError { entity: "appointment", from: self.code(), to: next.code() })
        }
    }

    pub fn can_reschedule(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Accepted)
    }
}

impl WorkoutSessionStatus {
    /// Sessions are created in progress and end exactly once, completed or cancelled.
    pub fn transition(self, next: WorkoutSessionStatus) -> Result<WorkoutSessionStatus, TransitionError> {
        use WorkoutSessionStatus::*;
        match (self, next) {
            (InProgress, Completed) | (InProgress, Cancelled) => Ok(next),
            _ => Err(TransitionError { entity: "workout session", from: self.code(), to: next.code() }),
        }
    }
}

impl ExerciseSessionStatus {
    pub fn transition(self, next: ExerciseSessionStatus) -> Result<ExerciseSessionStatus, TransitionError> {
        use ExerciseSessionStatus::*;
        match (self, next) {
            (NotStarted, InProgress)
            | (InProgress, Completed)
            | (InProgress, Skipped)
            | (NotStarted, Skipped) => Ok(next),
            _ => Err(TransitionError { entity: "exercise session", from: self.code(), to: next.code() }),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ExerciseSessionStatus::Completed | ExerciseSessionStatus::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_answers_pending_bond() {
        assert_eq!(
            BondStatus::Pending.transition(BondStatus::Accepted, Actor::Recipient),
            Ok(BondStatus::Accepted)
        );
        assert_eq!(
            BondStatus::Pending.transition(BondStatus::Rejected, Actor::Recipient),
            Ok(BondStatus::Rejected)
        );
        assert!(BondStatus::Pending.transition(BondStatus::Accepted, Actor::Sender).is_err());
    }

    #[test]
    fn only_sender_withdraws_pending_bond() {
        assert!(BondStatus::Pending.transition(BondStatus::Cancelled, Actor::Sender).is_ok());
        assert!(BondStatus::Pending.transition(BondStatus::Cancelled, Actor::Recipient).is_err());
    }

    #[test]
    fn either_party_cancels_accepted_bond() {
        for actor in [Actor::Sender, Actor::Recipient] {
            assert!(BondStatus::Accepted.transition(BondStatus::Cancelled, actor).is_ok());
        }
    }

    #[test]
    fn closed_bonds_are_terminal() {
        for from in [BondStatus::Rejected, BondStatus::Cancelled] {
            for to in BondStatus::ALL {
                assert!(from.transition(*to, Actor::Recipient).is_err(), "{from} -> {to}");
                assert!(from.transition(*to, Actor::Sender).is_err(), "{from} -> {to}");
            }
        }
        assert!(BondStatus::Accepted.transition(BondStatus::Rejected, Actor::Recipient).is_err());
        assert!(BondStatus::Accepted.transition(BondStatus::Pending, Actor::Sender).is_err());
    }

    #[test]
    fn active_bonds() {
        assert!(BondStatus::Pending.is_active());
        assert!(BondStatus::Accepted.is_active());
        assert!(!BondStatus::Rejected.is_active());
        assert!(!BondStatus::Cancelled.is_active());
    }

    #[test]
    fn appointment_cancellation_from_any_open_state() {
        for from in [AppointmentStatus::Pending, AppointmentStatus::Accepted, AppointmentStatus::Rejected] {
            assert!(from.transition(AppointmentStatus::Cancelled, Actor::Sender).is_ok());
        }
        assert!(AppointmentStatus::Cancelled
            .transition(AppointmentStatus::Cancelled, Actor::Sender)
            .is_err());
    }

    #[test]
    fn appointment_answer_requires_recipient() {
        assert!(AppointmentStatus::Pending
            .transition(AppointmentStatus::Accepted, Actor::Sender)
            .is_err());
        assert!(AppointmentStatus::Pending
            .transition(AppointmentStatus::Rejected, Actor::Recipient)
            .is_ok());
        assert!(AppointmentStatus::Accepted
            .transition(AppointmentStatus::Rejected, Actor::Recipient)
            .is_err());
    }

    #[test]
    fn workout_session_ends_once() {
        use WorkoutSessionStatus::*;
        assert_eq!(InProgress.transition(Completed), Ok(Completed));
        assert_eq!(InProgress.transition(Cancelled), Ok(Cancelled));
        assert!(Completed.transition(Cancelled).is_err());
        assert!(Cancelled.transition(Completed).is_err());
        assert!(InProgress.transition(InProgress).is_err());
    }

    #[test]
    fn exercise_session_lifecycle() {
        use ExerciseSessionStatus::*;
        assert!(NotStarted.transition(InProgress).is_ok());
        assert!(InProgress.transition(Completed).is_ok());
        assert!(InProgress.transition(Skipped).is_ok());
        assert!(NotStarted.transition(Skipped).is_ok());
        assert!(NotStarted.transition(Completed).is_err());
        assert!(Completed.transition(InProgress).is_err());
        assert!(Skipped.transition(InProgress).is_err());
    }

    #[test]
    fn transition_error_message_uses_codes() {
        let err = WorkoutSessionStatus::Completed
            .transition(WorkoutSessionStatus::Cancelled)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot move workout session from C to CA");
    }

    #[test]
    fn transition_error_maps_to_entity_conflict() {
        let err: AppError = BondStatus::Rejected
            .transition(BondStatus::Accepted, Actor::Recipient)
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), ErrorCode::InvalidBondTransition);

        let err: AppError = ExerciseSessionStatus::Completed
            .transition(ExerciseSessionStatus::Skipped)
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), ErrorCode::InvalidExerciseTransition);
    }

    #[test]
    fn status_codes_parse() {
        assert_eq!("SK".parse::<ExerciseSessionStatus>(), Ok(ExerciseSessionStatus::Skipped));
        assert_eq!("CA".parse::<WorkoutSessionStatus>(), Ok(WorkoutSessionStatus::Cancelled));
        assert!("X".parse::<BondStatus>().is_err());
    }
}
