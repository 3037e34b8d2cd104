#[cfg(test)]
mod tests {
    use crate::auth::{AuthError, encode_hex, sign_check_string, verify_init_data};

    const BOT_TOKEN: &str = "110201543:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw";
    const USER_JSON: &str =
        r#"{"id":279058397,"first_name":"Vladislava","last_name":"K","username":"vkay"}"#;

    /// Percent-encodes everything outside the URL-unreserved set, the way
    /// a browser encodes `initData` components.
    fn encode(component: &str) -> String {
        let mut out = String::new();
        for byte in component.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char);
                }
                _ => out.push_str(&format!("%{byte:02X}")),
            }
        }
        out
    }

    /// Builds a signed payload from decoded (key, value) fields.
    fn signed_payload(fields: &[(&str, &str)], bot_token: &str) -> String {
        let mut sorted: Vec<_> = fields.to_vec();
        sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        let check_string = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n");
        let hash = encode_hex(&sign_check_string(&check_string, bot_token));

        let mut payload = fields
            .iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        payload.push_str(&format!("&hash={hash}"));
        payload
    }

    fn valid_payload() -> String {
        signed_payload(
            &[
                ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
                ("user", USER_JSON),
                ("auth_date", "1662771648"),
            ],
            BOT_TOKEN,
        )
    }

    #[test]
    fn test_valid_payload_yields_identity() {
        let identity = verify_init_data(&valid_payload(), BOT_TOKEN).expect("payload is valid");

        assert_eq!(identity.external_id, 279_058_397);
        assert_eq!(identity.display_name, "Vladislava K");
        assert_eq!(identity.username.as_deref(), Some("vkay"));
    }

    #[test]
    fn test_field_order_does_not_matter() {
        // Same fields in a different wire order still verify: the check
        // string is built from the byte-wise key sort
        let payload = signed_payload(
            &[
                ("auth_date", "1662771648"),
                ("user", USER_JSON),
                ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
            ],
            BOT_TOKEN,
        );
        assert!(verify_init_data(&payload, BOT_TOKEN).is_ok());
    }

    #[test]
    fn test_flipping_any_payload_character_fails() {
        let payload = valid_payload();
        let flipped: String = {
            // Flip one character inside the auth_date value
            let target = "1662771648";
            payload.replace(target, "1662771649")
        };
        assert!(flipped != payload);
        assert!(matches!(
            verify_init_data(&flipped, BOT_TOKEN),
            Err(AuthError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_flipping_hash_character_fails() {
        let payload = valid_payload();
        let hash_start = payload.find("hash=").expect("payload has hash") + 5;
        let mut bytes = payload.into_bytes();
        // Hex digits only, so swapping 0<->1 always stays hex but changes the digest
        bytes[hash_start] = if bytes[hash_start] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(bytes).expect("still utf-8");

        assert!(matches!(
            verify_init_data(&tampered, BOT_TOKEN),
            Err(AuthError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_wrong_bot_token_fails() {
        assert!(matches!(
            verify_init_data(&valid_payload(), "42:wrong-token"),
            Err(AuthError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_missing_hash_fails() {
        let payload = format!("auth_date=1662771648&user={}", encode(USER_JSON));
        assert!(matches!(
            verify_init_data(&payload, BOT_TOKEN),
            Err(AuthError::MissingHash)
        ));
    }

    #[test]
    fn test_non_hex_hash_fails() {
        let payload = "auth_date=1&hash=nothex".to_string();
        assert!(matches!(
            verify_init_data(&payload, BOT_TOKEN),
            Err(AuthError::MalformedHash)
        ));
    }

    #[test]
    fn test_missing_user_field_fails() {
        let payload = signed_payload(&[("auth_date", "1662771648")], BOT_TOKEN);
        assert!(matches!(
            verify_init_data(&payload, BOT_TOKEN),
            Err(AuthError::MissingUser)
        ));
    }

    #[test]
    fn test_malformed_user_json_fails() {
        let payload = signed_payload(
            &[("auth_date", "1662771648"), ("user", "{not json")],
            BOT_TOKEN,
        );
        assert!(matches!(
            verify_init_data(&payload, BOT_TOKEN),
            Err(AuthError::MalformedUser(_))
        ));
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(matches!(
            verify_init_data("", BOT_TOKEN),
            Err(AuthError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_optional_user_fields() {
        let minimal_user = r#"{"id":7,"first_name":"Ada"}"#;
        let payload = signed_payload(
            &[("auth_date", "1662771648"), ("user", minimal_user)],
            BOT_TOKEN,
        );
        let identity = verify_init_data(&payload, BOT_TOKEN).expect("minimal user is valid");

        assert_eq!(identity.external_id, 7);
        assert_eq!(identity.display_name, "Ada");
        assert_eq!(identity.username, None);
    }

    #[test]
    fn test_plus_decodes_as_space() {
        let user = r#"{"id":7,"first_name":"Ada Lovelace"}"#;
        // Encode the space as '+' instead of %20
        let encoded_user = encode(user).replace("%20", "+");
        let check_string = format!("auth_date=1662771648\nuser={user}");
        let hash = encode_hex(&sign_check_string(&check_string, BOT_TOKEN));
        let payload = format!("auth_date=1662771648&user={encoded_user}&hash={hash}");

        let identity = verify_init_data(&payload, BOT_TOKEN).expect("plus-encoded space");
        assert_eq!(identity.display_name, "Ada Lovelace");
    }
}
