//! User-Friendly Error Formatting
//!
//! Provides user-friendly error messages with troubleshooting hints
//! for common error scenarios.

use std::fmt::Write;

use crate::display::DisplayError;

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(&mut output, "╔════════════════════════════════════════════════════════════╗").ok();
    writeln!(&mut output, "║                     ERROR                                  ║").ok();
    writeln!(&mut output, "╚════════════════════════════════════════════════════════════╝").ok();
    writeln!(&mut output).ok();

    let error_msg = error.to_string();

    match error.chain().find_map(|cause| cause.downcast_ref::<DisplayError>()) {
        Some(DisplayError::InvalidSpec(spec)) => format_spec_error(&mut output, spec),
        Some(DisplayError::InvalidConfiguration(problem)) => {
            format_config_error(&mut output, problem)
        }
        Some(DisplayError::InvalidRotation(degrees)) => {
            format_rotation_error(&mut output, *degrees)
        }
        Some(other) => format_generic_error(&mut output, &other.to_string()),
        None if error_msg.contains("config") => format_config_error(&mut output, &error_msg),
        None => format_generic_error(&mut output, &error_msg),
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(&mut output, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━").ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    // Footer with help
    writeln!(&mut output, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━").ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: lamco-display-manager -vvv"
    )
    .ok();
    writeln!(&mut output, "╚════════════════════════════════════════════════════════════╝").ok();

    output
}

fn format_spec_error(output: &mut String, spec: &str) {
    writeln!(output, "Display Spec Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not read the display description '{}'.", spec).ok();
    writeln!(output).ok();
    writeln!(output, "Expected Format:").ok();
    writeln!(output).ok();
    writeln!(output, "  [X+Y-]WxH[*SCALE][/OPTIONS][@UI_SCALE][#RES|RES...]").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Size must be positive").ok();
    writeln!(output, "     → 1920x1080, not 0x1080").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Scales must be positive numbers").ok();
    writeln!(output, "     → 2560x1700*2@1.25").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Resolutions are WxH, optionally followed by 'i'").ok();
    writeln!(output, "     → 1920x1080#1920x1080|1280x720|1920x1080i").ok();
}

fn format_rotation_error(output: &mut String, degrees: u16) {
    writeln!(output, "Rotation Error").ok();
    writeln!(output).ok();
    writeln!(output, "{} degrees is not a supported rotation.", degrees).ok();
    writeln!(output).ok();
    writeln!(output, "  → Use one of 0, 90, 180, 270").ok();
}

fn format_config_error(output: &mut String, _error: &str) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(
        output,
        "     → Specify: lamco-display-manager --config /path/to/config.toml"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Invalid values").ok();
    writeln!(output, "     → Layouts must name two different displays").ok();
    writeln!(output, "     → A layout's primary must be one of its displays").ok();
    writeln!(output, "     → UI scales must be positive, overscan non-negative").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Display Manager Error").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}
