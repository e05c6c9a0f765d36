fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn format_line(code: &str, component: &str, action: &str, subject: &str, err: &str) -> String {
    format!(
        "NEWSARCHIVE_WARN code={} component={} action={} subject={} err={}",
        sanitize_value(code),
        sanitize_value(component),
        sanitize_value(action),
        sanitize_value(subject),
        sanitize_value(err),
    )
}

pub fn emit(code: &str, component: &str, action: &str, subject: &str, err: &str) {
    eprintln!("{}", format_line(code, component, action, subject, err));
}
