mod assignment;
mod deploy;
mod form;
mod response;
mod results;

pub use assignment::{AssignmentStatus, AssignmentView};
pub use deploy::{DeployOutcome, DeployRequest};
pub use form::{
    FormDescription, FormMetadata, FormSpec, FormView, QuestionPatch, ScheduleView, SectionPatch,
};
pub use response::{ResponseDescription, SubmissionReceipt, SubmissionRequest, SubmissionSummary};
pub use results::{Analytics, Bucket, FormResults, QuestionResults};
