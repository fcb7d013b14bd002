//! Interface copy for the server-rendered pages, in Arabic and English.
//!
//! Only the strings the built-in pages need live here; listing and CRM
//! screens are rendered by the client application.

use hrtaj_core::Locale;

/// Page copy for one locale.
#[derive(Debug)]
pub struct Messages {
    pub site_name: &'static str,
    pub tagline: &'static str,
    pub nav_home: &'static str,
    pub nav_dashboard: &'static str,
    pub nav_team: &'static str,
    pub nav_owner: &'static str,
    pub sign_in: &'static str,
    pub sign_out: &'static str,
    pub login_title: &'static str,
    pub team_login_title: &'static str,
    pub email_label: &'static str,
    pub password_label: &'static str,
    pub error_invalid_credentials: &'static str,
    pub error_account_disabled: &'static str,
    pub error_unavailable: &'static str,
    pub dashboard_title: &'static str,
    pub role_label: &'static str,
    pub unauthorized_notice: &'static str,
    pub team_title: &'static str,
    pub team_intro: &'static str,
    pub owner_title: &'static str,
    pub owner_locked_notice: &'static str,
    pub owner_secret_label: &'static str,
    pub owner_unlock: &'static str,
    pub owner_lock: &'static str,
    pub owner_invalid_secret: &'static str,
    pub owner_unlocked_notice: &'static str,
    pub switch_language: &'static str,
    pub switch_language_code: &'static str,
}

const AR: Messages = Messages {
    site_name: "هارتچ",
    tagline: "سوق العقارات في مصر: إعادة بيع ومشروعات جديدة",
    nav_home: "الرئيسية",
    nav_dashboard: "حسابي",
    nav_team: "مساحة الفريق",
    nav_owner: "لوحة المالك",
    sign_in: "تسجيل الدخول",
    sign_out: "تسجيل الخروج",
    login_title: "تسجيل الدخول",
    team_login_title: "دخول فريق العمل",
    email_label: "البريد الإلكتروني",
    password_label: "كلمة المرور",
    error_invalid_credentials: "البريد الإلكتروني أو كلمة المرور غير صحيحة.",
    error_account_disabled: "تم إيقاف هذا الحساب. تواصل مع الإدارة.",
    error_unavailable: "الخدمة غير متاحة حالياً. حاول مرة أخرى بعد قليل.",
    dashboard_title: "حسابي",
    role_label: "الدور",
    unauthorized_notice: "ليست لديك صلاحية لفتح الصفحة المطلوبة.",
    team_title: "مساحة الفريق",
    team_intro: "العملاء المحتملون والاستيراد ومتابعة الحضور.",
    owner_title: "لوحة المالك",
    owner_locked_notice: "لوحة المالك مقفلة. أدخل المفتاح السري للمتابعة.",
    owner_secret_label: "المفتاح السري",
    owner_unlock: "فتح",
    owner_lock: "قفل",
    owner_invalid_secret: "المفتاح السري غير صحيح.",
    owner_unlocked_notice: "لوحة المالك مفتوحة على هذا الجهاز لمدة 12 ساعة.",
    switch_language: "English",
    switch_language_code: "en",
};

const EN: Messages = Messages {
    site_name: "Hrtaj",
    tagline: "Egypt's real-estate marketplace for resale homes and new projects",
    nav_home: "Home",
    nav_dashboard: "My account",
    nav_team: "Team workspace",
    nav_owner: "Owner console",
    sign_in: "Sign in",
    sign_out: "Sign out",
    login_title: "Sign in",
    team_login_title: "Team sign in",
    email_label: "Email",
    password_label: "Password",
    error_invalid_credentials: "Incorrect email or password.",
    error_account_disabled: "This account has been disabled. Contact an administrator.",
    error_unavailable: "The service is unavailable right now. Please try again shortly.",
    dashboard_title: "My account",
    role_label: "Role",
    unauthorized_notice: "You do not have access to the requested page.",
    team_title: "Team workspace",
    team_intro: "Leads, imports and presence tracking.",
    owner_title: "Owner console",
    owner_locked_notice: "The owner console is locked. Enter the owner secret to continue.",
    owner_secret_label: "Owner secret",
    owner_unlock: "Unlock",
    owner_lock: "Lock",
    owner_invalid_secret: "That secret is not correct.",
    owner_unlocked_notice: "The owner console is unlocked on this device for 12 hours.",
    switch_language: "العربية",
    switch_language_code: "ar",
};

impl Messages {
    /// Copy for `locale`.
    #[must_use]
    pub const fn for_locale(locale: Locale) -> &'static Self {
        match locale {
            Locale::Ar => &AR,
            Locale::En => &EN,
        }
    }

    /// Text for a login error code from the query string.
    #[must_use]
    pub fn login_error(&self, code: &str) -> &'static str {
        match code {
            "account_disabled" => self.error_account_disabled,
            "unavailable" => self.error_unavailable,
            _ => self.error_invalid_credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locales_switch_to_each_other() {
        assert_eq!(Messages::for_locale(Locale::Ar).switch_language_code, "en");
        assert_eq!(Messages::for_locale(Locale::En).switch_language_code, "ar");
    }

    #[test]
    fn test_login_error_codes() {
        let en = Messages::for_locale(Locale::En);
        assert_eq!(en.login_error("account_disabled"), en.error_account_disabled);
        assert_eq!(en.login_error("unavailable"), en.error_unavailable);
        assert_eq!(en.login_error("anything"), en.error_invalid_credentials);
    }
}
