use chrono::NaiveDate;

use crate::model::{DayRange, TechId};

/// Why a coverage workflow proposal was rejected.
///
/// Messages are shown to the operator as-is, so each names the precondition
/// that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    SelfCoverage(TechId),
    DuplicateTechnician(TechId),
    OverlappingPartition(String),
    CoveringTechNotService(TechId),
    UnknownTechnician(TechId),
    PropertyNotOnRoute(String),
    EmptyRoute,
    InvalidRange(DayRange),
    RangeTooLong { days: i64, max: i64 },
    OutsideWeek(NaiveDate),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowError::SelfCoverage(id) => {
                write!(f, "technician {id} cannot cover their own route")
            }
            WorkflowError::DuplicateTechnician(id) => {
                write!(f, "technician {id} is selected more than once")
            }
            WorkflowError::OverlappingPartition(property) => {
                write!(f, "property {property} is assigned to both technicians")
            }
            WorkflowError::CoveringTechNotService(id) => {
                write!(f, "technician {id} is not a service technician")
            }
            WorkflowError::UnknownTechnician(id) => write!(f, "unknown technician: {id}"),
            WorkflowError::PropertyNotOnRoute(property) => {
                write!(f, "property {property} is not on this route for the day")
            }
            WorkflowError::EmptyRoute => write!(f, "no properties are due on this day"),
            WorkflowError::InvalidRange(range) => {
                write!(f, "date range {} to {} ends before it starts", range.start, range.end)
            }
            WorkflowError::RangeTooLong { days, max } => {
                write!(f, "date range spans {days} days; at most {max} allowed")
            }
            WorkflowError::OutsideWeek(date) => {
                write!(f, "{date} is not in the visible week")
            }
            WorkflowError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for WorkflowError {}
