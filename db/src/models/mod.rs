pub mod attendance_record;
pub mod biometric_profile;
pub mod cache_entry;
pub mod course;
pub mod enrollment;
pub mod location;
pub mod session;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use biometric_profile::Entity as BiometricProfile;
pub use cache_entry::Entity as CacheEntry;
pub use course::Entity as Course;
pub use enrollment::Entity as Enrollment;
pub use location::Entity as Location;
pub use session::Entity as Session;
pub use user::Entity as User;
