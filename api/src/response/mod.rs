use serde::Serialize;

/// The JSON envelope every endpoint answers with.
///
/// ```json
/// { "success": true, "data": { ... }, "message": "Attendance recorded" }
/// ```
///
/// Failures keep the same shape with `success: false`. Engine errors put
/// their machine-readable details in `data`; everything else leaves it empty.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// A failure without details; `data` is `T::default()`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }

    /// A failure that still carries a payload, e.g. an error kind and score.
    pub fn failure(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            message: message.into(),
        }
    }
}
