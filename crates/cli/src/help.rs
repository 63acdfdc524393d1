//! Help text for the selected provider.

use cliapi_engine::{Provider, ResolutionError};
use cliapi_registry::{OptionSurface, PathStep};

/// Help when no provider could be selected: usage and common options only.
pub fn render_common_help(program: &str) -> String {
    let surface = OptionSurface::common_only();
    format!(
        "{}\n\nCommon CLI options:\n{}\n",
        surface.render_usage(program),
        surface.render_common_options()
    )
}

/// Full help for `provider`.
///
/// Rendering resolves every API so the display options can be listed. If
/// that fails, whatever resolved is still listed, followed by the reason.
pub fn render_provider_help(provider: &mut Provider, surface: &OptionSurface, program: &str) -> String {
    let name = provider.name().to_string();
    let resolved = provider.resolve_all();

    let mut sections = vec![surface.render_usage(program)];

    let mut display = vec![format!("***[ {name} ]*** provider Display options:")];
    display.extend(provider.scan_resolved().map(|(path, _)| {
        let label = match path.leaf() {
            Some(PathStep::Key(key)) => key.clone(),
            Some(PathStep::Index(index)) => format!("[{index}]"),
            None => String::new(),
        };
        format!("{}{label}", "  ".repeat(path.len()))
    }));
    if let Err(error) = resolved {
        display.push(resolution_note(&error));
    }
    sections.push(display.join("\n"));

    let registry = provider.registry();
    if !registry.scoops.is_empty() {
        let mut scoops = vec![format!("***[ {name} ]*** provider scoops (--item=NAME):")];
        scoops.extend(
            registry
                .scoops
                .iter()
                .map(|(scoop, path)| match registry.help_for(scoop) {
                    Some(help) => format!("  {scoop:<17}  {help} ({path})"),
                    None => format!("  {scoop:<17}  {path}"),
                }),
        );
        sections.push(scoops.join("\n"));
    }

    let options = surface.render_provider_options();
    if options.is_empty() {
        sections.push(format!("***[ {name} ]*** provider API config options: none"));
    } else {
        sections.push(format!("***[ {name} ]*** provider API config options:\n{options}"));
    }

    sections.push(format!("Common CLI options:\n{}", surface.render_common_options()));
    format!("{}\n", sections.join("\n\n"))
}

fn resolution_note(error: &ResolutionError) -> String {
    match error.missing_option() {
        Some(option) => {
            format!("  (required option --{option} missing; required options must be provided to list all displayable API options)")
        }
        None => format!("  ({error})"),
    }
}
