pub mod m202510010001_create_users;
pub mod m202510010002_create_courses;
pub mod m202510010003_create_enrollments;
pub mod m202510010004_create_locations;
pub mod m202510010005_create_sessions;
pub mod m202510010006_create_biometric_profiles;
pub mod m202510010007_create_attendance_records;
pub mod m202510010008_create_cache_entries;
