use serde::Serialize;

/// Success envelope: every 2xx body carries a human-readable message plus the
/// payload under `data`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub message: &'static str,
    pub data: T,
}

pub fn envelope<T: Serialize>(message: &'static str, data: T) -> Envelope<T> {
    Envelope { message, data }
}

pub mod messages {
    pub const REGISTERED: &str = "User registered successfully.";
    pub const LOGGED_IN: &str = "User logged in successfully.";
    pub const NOTIFICATION_SENT: &str = "Notification sent successfully.";
    pub const PASSWORD_RESET: &str = "Password reset successfully.";
    pub const APPLICATION_SUBMITTED: &str = "Application submitted successfully.";
    pub const PROFILE_FETCHED: &str = "Profile retrieved successfully.";
    pub const PROFILE_UPDATED: &str = "Profile updated successfully.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_message_and_data() {
        let body = envelope(messages::REGISTERED, serde_json::json!({"userId": "abc"}));
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("User registered successfully."));
        assert!(json.contains("userId"));
    }
}
