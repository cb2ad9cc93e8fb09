// mail/mails.rs
use super::sendmail::{render_template, MailError, Mailer};
use crate::{models::bookingmodel::BookingStatus, utils::locale::Locale};

const VERIFICATION_TEMPLATE: &str = include_str!("templates/verification.html");
const WELCOME_TEMPLATE: &str = include_str!("templates/welcome.html");
const RESET_PASSWORD_TEMPLATE: &str = include_str!("templates/reset_password.html");
const BOOKING_STATUS_TEMPLATE: &str = include_str!("templates/booking_status.html");

/// Localized copy for one email.
struct Copy {
    subject: &'static str,
    heading: &'static str,
    body: &'static str,
    action: &'static str,
}

fn verification_copy(locale: Locale) -> Copy {
    match locale {
        Locale::En => Copy {
            subject: "Verify your ManzelHelp email",
            heading: "Confirm your email address",
            body: "Thanks for joining ManzelHelp. Please confirm your email address. The link is valid for 24 hours.",
            action: "Verify email",
        },
        Locale::Fr => Copy {
            subject: "Vérifiez votre adresse e-mail ManzelHelp",
            heading: "Confirmez votre adresse e-mail",
            body: "Merci de rejoindre ManzelHelp. Veuillez confirmer votre adresse e-mail. Le lien est valable 24 heures.",
            action: "Vérifier l'e-mail",
        },
        Locale::Ar => Copy {
            subject: "تأكيد بريدك الإلكتروني في ManzelHelp",
            heading: "أكّد عنوان بريدك الإلكتروني",
            body: "شكرًا لانضمامك إلى ManzelHelp. يرجى تأكيد بريدك الإلكتروني. الرابط صالح لمدة 24 ساعة.",
            action: "تأكيد البريد",
        },
        Locale::De => Copy {
            subject: "Bestätige deine ManzelHelp E-Mail",
            heading: "E-Mail-Adresse bestätigen",
            body: "Danke, dass du ManzelHelp beigetreten bist. Bitte bestätige deine E-Mail-Adresse. Der Link ist 24 Stunden gültig.",
            action: "E-Mail bestätigen",
        },
    }
}

fn welcome_copy(locale: Locale) -> Copy {
    match locale {
        Locale::En => Copy {
            subject: "Welcome to ManzelHelp",
            heading: "Welcome aboard",
            body: "Your email is verified. You can now book trusted taskers or offer your own services.",
            action: "Open ManzelHelp",
        },
        Locale::Fr => Copy {
            subject: "Bienvenue sur ManzelHelp",
            heading: "Bienvenue",
            body: "Votre e-mail est vérifié. Vous pouvez réserver des prestataires de confiance ou proposer vos services.",
            action: "Ouvrir ManzelHelp",
        },
        Locale::Ar => Copy {
            subject: "مرحبًا بك في ManzelHelp",
            heading: "أهلًا بك",
            body: "تم تأكيد بريدك الإلكتروني. يمكنك الآن حجز مقدمي خدمات موثوقين أو عرض خدماتك.",
            action: "افتح ManzelHelp",
        },
        Locale::De => Copy {
            subject: "Willkommen bei ManzelHelp",
            heading: "Willkommen",
            body: "Deine E-Mail ist bestätigt. Du kannst jetzt vertrauenswürdige Helfer buchen oder eigene Dienste anbieten.",
            action: "ManzelHelp öffnen",
        },
    }
}

fn reset_password_copy(locale: Locale) -> Copy {
    match locale {
        Locale::En => Copy {
            subject: "Reset your ManzelHelp password",
            heading: "Password reset",
            body: "We received a request to reset your password. The link is valid for 30 minutes. If you did not ask for this, ignore this email.",
            action: "Reset password",
        },
        Locale::Fr => Copy {
            subject: "Réinitialisez votre mot de passe ManzelHelp",
            heading: "Réinitialisation du mot de passe",
            body: "Nous avons reçu une demande de réinitialisation de votre mot de passe. Le lien est valable 30 minutes. Si vous n'êtes pas à l'origine de cette demande, ignorez cet e-mail.",
            action: "Réinitialiser",
        },
        Locale::Ar => Copy {
            subject: "إعادة تعيين كلمة مرور ManzelHelp",
            heading: "إعادة تعيين كلمة المرور",
            body: "تلقينا طلبًا لإعادة تعيين كلمة المرور. الرابط صالح لمدة 30 دقيقة. إذا لم تطلب ذلك فتجاهل هذه الرسالة.",
            action: "إعادة التعيين",
        },
        Locale::De => Copy {
            subject: "ManzelHelp Passwort zurücksetzen",
            heading: "Passwort zurücksetzen",
            body: "Wir haben eine Anfrage zum Zurücksetzen deines Passworts erhalten. Der Link ist 30 Minuten gültig. Falls du das nicht warst, ignoriere diese E-Mail.",
            action: "Passwort zurücksetzen",
        },
    }
}

fn booking_status_copy(locale: Locale) -> Copy {
    match locale {
        Locale::En => Copy {
            subject: "Your ManzelHelp booking was updated",
            heading: "Booking update",
            body: "The status of your booking is now:",
            action: "View booking",
        },
        Locale::Fr => Copy {
            subject: "Votre réservation ManzelHelp a été mise à jour",
            heading: "Mise à jour de la réservation",
            body: "Le statut de votre réservation est maintenant :",
            action: "Voir la réservation",
        },
        Locale::Ar => Copy {
            subject: "تم تحديث حجزك في ManzelHelp",
            heading: "تحديث الحجز",
            body: "حالة حجزك الآن:",
            action: "عرض الحجز",
        },
        Locale::De => Copy {
            subject: "Deine ManzelHelp Buchung wurde aktualisiert",
            heading: "Buchungsupdate",
            body: "Der Status deiner Buchung ist jetzt:",
            action: "Buchung ansehen",
        },
    }
}

pub fn status_label(status: BookingStatus, locale: Locale) -> &'static str {
    use BookingStatus::*;
    match (locale, status) {
        (Locale::En, Pending) => "Pending",
        (Locale::En, Accepted) => "Accepted",
        (Locale::En, Confirmed) => "Confirmed",
        (Locale::En, InProgress) => "In progress",
        (Locale::En, Completed) => "Completed",
        (Locale::En, Cancelled) => "Cancelled",
        (Locale::En, Disputed) => "Disputed",
        (Locale::En, Refunded) => "Refunded",
        (Locale::Fr, Pending) => "En attente",
        (Locale::Fr, Accepted) => "Acceptée",
        (Locale::Fr, Confirmed) => "Confirmée",
        (Locale::Fr, InProgress) => "En cours",
        (Locale::Fr, Completed) => "Terminée",
        (Locale::Fr, Cancelled) => "Annulée",
        (Locale::Fr, Disputed) => "En litige",
        (Locale::Fr, Refunded) => "Remboursée",
        (Locale::Ar, Pending) => "قيد الانتظار",
        (Locale::Ar, Accepted) => "مقبول",
        (Locale::Ar, Confirmed) => "مؤكد",
        (Locale::Ar, InProgress) => "قيد التنفيذ",
        (Locale::Ar, Completed) => "مكتمل",
        (Locale::Ar, Cancelled) => "ملغى",
        (Locale::Ar, Disputed) => "متنازع عليه",
        (Locale::Ar, Refunded) => "مسترد",
        (Locale::De, Pending) => "Ausstehend",
        (Locale::De, Accepted) => "Angenommen",
        (Locale::De, Confirmed) => "Bestätigt",
        (Locale::De, InProgress) => "In Bearbeitung",
        (Locale::De, Completed) => "Abgeschlossen",
        (Locale::De, Cancelled) => "Storniert",
        (Locale::De, Disputed) => "Angefochten",
        (Locale::De, Refunded) => "Erstattet",
    }
}

fn base_placeholders(locale: Locale, copy: &Copy, username: &str, link: &str) -> Vec<(&'static str, String)> {
    vec![
        ("lang", locale.to_str().to_string()),
        ("dir", locale.dir().to_string()),
        ("heading", copy.heading.to_string()),
        ("body", copy.body.to_string()),
        ("action", copy.action.to_string()),
        ("username", username.to_string()),
        ("link", link.to_string()),
    ]
}

pub async fn send_verification_email(
    mailer: &Mailer,
    to_email: &str,
    username: &str,
    locale: Locale,
    verification_link: &str,
) -> Result<(), MailError> {
    let copy = verification_copy(locale);
    let html = render_template(
        VERIFICATION_TEMPLATE,
        &base_placeholders(locale, &copy, username, verification_link),
    );
    mailer.send(to_email, copy.subject, &html).await
}

pub async fn send_welcome_email(
    mailer: &Mailer,
    to_email: &str,
    username: &str,
    locale: Locale,
    app_link: &str,
) -> Result<(), MailError> {
    let copy = welcome_copy(locale);
    let html = render_template(WELCOME_TEMPLATE, &base_placeholders(locale, &copy, username, app_link));
    mailer.send(to_email, copy.subject, &html).await
}

pub async fn send_forgot_password_email(
    mailer: &Mailer,
    to_email: &str,
    username: &str,
    locale: Locale,
    reset_link: &str,
) -> Result<(), MailError> {
    let copy = reset_password_copy(locale);
    let html = render_template(
        RESET_PASSWORD_TEMPLATE,
        &base_placeholders(locale, &copy, username, reset_link),
    );
    mailer.send(to_email, copy.subject, &html).await
}

pub fn booking_status_html(username: &str, locale: Locale, status: BookingStatus, booking_link: &str) -> String {
    let copy = booking_status_copy(locale);
    let mut placeholders = base_placeholders(locale, &copy, username, booking_link);
    placeholders.push(("status", status_label(status, locale).to_string()));
    render_template(BOOKING_STATUS_TEMPLATE, &placeholders)
}

pub async fn send_booking_status_email(
    mailer: &Mailer,
    to_email: &str,
    username: &str,
    locale: Locale,
    status: BookingStatus,
    booking_link: &str,
) -> Result<(), MailError> {
    let html = booking_status_html(username, locale, status, booking_link);
    mailer.send(to_email, booking_status_copy(locale).subject, &html).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_mail_is_rtl() {
        let html = booking_status_html("Amina", Locale::Ar, BookingStatus::Completed, "https://x/b/1");
        assert!(html.contains(r#"dir="rtl""#));
        assert!(html.contains(r#"lang="ar""#));
        assert!(html.contains("مكتمل"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn subjects_follow_locale() {
        assert_eq!(verification_copy(Locale::Fr).subject, "Vérifiez votre adresse e-mail ManzelHelp");
        assert_eq!(reset_password_copy(Locale::De).subject, "ManzelHelp Passwort zurücksetzen");
        assert_eq!(welcome_copy(Locale::En).subject, "Welcome to ManzelHelp");
    }

    #[test]
    fn every_template_is_fully_substituted() {
        for template in [VERIFICATION_TEMPLATE, WELCOME_TEMPLATE, RESET_PASSWORD_TEMPLATE] {
            let copy = welcome_copy(Locale::De);
            let html = render_template(template, &base_placeholders(Locale::De, &copy, "Jonas", "https://x"));
            assert!(!html.contains("{{"), "unreplaced placeholder in template");
            assert!(html.contains(r#"dir="ltr""#));
        }
    }
}
