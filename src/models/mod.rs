mod alert;
mod geo;
mod notification;
mod posting;

pub use alert::{AlertRow, AlertSubscription};
pub use geo::GeoPoint;
pub use notification::{
    NEW_JOB_NEARBY, NewJobNearbyPayload, NewNotification, Notification, NotificationRow,
};
pub use posting::{JobPosting, JobPostingRow, PostingStatus, UNKNOWN_EMPLOYER};
