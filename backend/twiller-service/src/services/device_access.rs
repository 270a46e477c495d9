/// Device access policy.
///
/// The ad-hoc rules carried over from the product: Chrome logins need an
/// email OTP, Edge does not, and mobile devices may only log in between
/// 10:00 and 12:59 server-local time.
use serde::Serialize;

use crate::domain::models::DeviceInfo;

/// Mobile access window, inclusive start / exclusive end, in local hours.
const MOBILE_WINDOW_START_HOUR: u32 = 10;
const MOBILE_WINDOW_END_HOUR: u32 = 13;

/// Requirements imposed on a login attempt from a given device.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequirements {
    pub allow_access: bool,
    pub requires_otp: bool,
    pub reason: String,
}

/// Evaluate the access policy for a device at the given local hour.
///
/// The hour is a parameter so the time-of-day rule is testable.
pub fn evaluate(device: &DeviceInfo, local_hour: u32) -> AuthRequirements {
    let mut requirements = AuthRequirements {
        allow_access: true,
        requires_otp: false,
        reason: String::new(),
    };

    match device.browser.as_deref() {
        Some("Chrome") => {
            requirements.requires_otp = true;
            requirements.reason =
                "Chrome browser requires OTP verification for enhanced security".to_string();
        }
        Some("Edge") => {
            requirements.requires_otp = false;
            requirements.reason =
                "Edge browser - no additional authentication required".to_string();
        }
        _ => {}
    }

    if device.device_type.as_deref() == Some("Mobile") {
        if local_hour < MOBILE_WINDOW_START_HOUR || local_hour >= MOBILE_WINDOW_END_HOUR {
            requirements.allow_access = false;
            requirements.reason =
                "Mobile access is only allowed between 10:00 AM - 1:00 PM".to_string();
        } else {
            requirements.reason =
                "Mobile access granted (within allowed hours: 10:00 AM - 1:00 PM)".to_string();
        }
    }

    requirements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(browser: Option<&str>, device_type: Option<&str>) -> DeviceInfo {
        DeviceInfo {
            browser: browser.map(String::from),
            device_type: device_type.map(String::from),
            ..DeviceInfo::default()
        }
    }

    #[test]
    fn chrome_requires_otp() {
        let req = evaluate(&device(Some("Chrome"), Some("Desktop")), 11);
        assert!(req.allow_access);
        assert!(req.requires_otp);
    }

    #[test]
    fn edge_needs_no_extra_auth() {
        let req = evaluate(&device(Some("Edge"), Some("Desktop")), 11);
        assert!(req.allow_access);
        assert!(!req.requires_otp);
    }

    #[test]
    fn mobile_allowed_inside_window() {
        for hour in 10..13 {
            let req = evaluate(&device(Some("Safari"), Some("Mobile")), hour);
            assert!(req.allow_access, "hour {} should be allowed", hour);
        }
    }

    #[test]
    fn mobile_denied_outside_window() {
        for hour in [0, 9, 13, 18, 23] {
            let req = evaluate(&device(Some("Safari"), Some("Mobile")), hour);
            assert!(!req.allow_access, "hour {} should be denied", hour);
        }
    }

    #[test]
    fn mobile_chrome_outside_window_is_denied_but_still_flags_otp() {
        let req = evaluate(&device(Some("Chrome"), Some("Mobile")), 8);
        assert!(!req.allow_access);
        assert!(req.requires_otp);
    }
}
