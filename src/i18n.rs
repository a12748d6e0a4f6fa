use crate::identity::AuthError;
use crate::models::Lang;

/// Localized message tables for user-visible failures. Only the strings a
/// form can actually show live here; everything else (labels, content) is a
/// frontend concern.

/// Message shown for a failed sign-in/sign-up/reset attempt. Raw provider
/// codes are mapped here and never shown directly.
pub fn auth_message(lang: Lang, err: &AuthError) -> &'static str {
    match lang {
        Lang::Th => match err {
            AuthError::EmailAlreadyInUse => "อีเมลนี้ถูกใช้งานแล้ว",
            AuthError::InvalidEmail => "รูปแบบอีเมลไม่ถูกต้อง",
            AuthError::WeakPassword => "รหัสผ่านอ่อนแอเกินไป",
            AuthError::UserNotFound => "ไม่พบผู้ใช้",
            AuthError::WrongPassword => "รหัสผ่านไม่ถูกต้อง",
            AuthError::InvalidCredential => "อีเมลหรือรหัสผ่านไม่ถูกต้อง",
            AuthError::SessionExpired => "เซสชันหมดอายุ กรุณาเข้าสู่ระบบอีกครั้ง",
            _ => "เกิดข้อผิดพลาด",
        },
        Lang::Ms => match err {
            AuthError::EmailAlreadyInUse => "E-mel ini telah digunakan",
            AuthError::InvalidEmail => "Format e-mel tidak sah",
            AuthError::WeakPassword => "Kata laluan terlalu lemah",
            AuthError::UserNotFound => "Pengguna tidak ditemui",
            AuthError::WrongPassword => "Kata laluan salah",
            AuthError::InvalidCredential => "E-mel atau kata laluan tidak sah",
            AuthError::SessionExpired => "Sesi telah tamat, sila log masuk semula",
            _ => "Ralat telah berlaku",
        },
    }
}

/// Message shown when federated sign-in fails (a dismissed window shows
/// nothing at all and never reaches this table).
pub fn federated_message(lang: Lang) -> &'static str {
    match lang {
        Lang::Th => "เกิดข้อผิดพลาดในการเข้าสู่ระบบด้วย Google",
        Lang::Ms => "Ralat semasa log masuk dengan Google",
    }
}

/// Confirmation that a password-reset email was dispatched.
pub fn reset_sent_message(lang: Lang) -> &'static str {
    match lang {
        Lang::Th => "ส่งลิงก์รีเซ็ตรหัสผ่านไปยังอีเมลแล้ว",
        Lang::Ms => "Pautan tetapan semula kata laluan telah dihantar ke e-mel",
    }
}

/// Generic message for a failed store operation; the caller keeps its
/// previous list state.
pub fn store_message(lang: Lang) -> &'static str {
    match lang {
        Lang::Th => "ไม่สามารถบันทึกข้อมูลได้ กรุณาลองใหม่อีกครั้ง",
        Lang::Ms => "Gagal menyimpan data, sila cuba lagi",
    }
}

/// Message for a form submitted with required fields missing.
pub fn validation_message(lang: Lang) -> &'static str {
    match lang {
        Lang::Th => "กรุณากรอกข้อมูลให้ครบถ้วน",
        Lang::Ms => "Sila lengkapkan maklumat yang diperlukan",
    }
}

/// Message for an unsupported language code on the preference endpoint.
pub fn unsupported_language_message(lang: Lang) -> &'static str {
    match lang {
        Lang::Th => "ไม่รองรับภาษานี้",
        Lang::Ms => "Bahasa ini tidak disokong",
    }
}
