use std::sync::OnceLock;

use regex::Regex;

pub fn required(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{label} is required"));
    }
    Ok(())
}

pub fn email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn phone(phone: &str) -> Result<(), String> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err("Phone number is required".to_string());
    }

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9 ()-]{7,20}$").expect("Failed to compile phone regex"));

    if !regex.is_match(phone) {
        return Err("Invalid phone number".to_string());
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits < 7 {
        return Err("Phone number must contain at least 7 digits".to_string());
    }

    Ok(())
}

pub fn password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

pub fn plate(plate: &str) -> Result<(), String> {
    let plate = plate.trim();
    if plate.is_empty() {
        return Err("License plate is required".to_string());
    }

    static PLATE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PLATE_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{1,11}$").expect("Failed to compile plate regex")
    });

    if !regex.is_match(plate) {
        return Err("License plate may only contain letters, digits, spaces and dashes".to_string());
    }

    Ok(())
}
