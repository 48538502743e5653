use color_print::cformat;
use prompt_harness::battery;
use prompt_harness::scenario::Support;
use prompt_harness::styling::{format_line_list, format_with_gutter, hint_message, info_message, println};

/// Print every battery scenario with its fixture, commands and expectations.
pub(crate) fn handle_list() -> anyhow::Result<()> {
    for scenario in battery::all() {
        let name = &scenario.name;
        let fixture = &scenario.fixture;
        println!("{}", info_message(cformat!("<bold>{name}</> <dim>[{fixture}]</>")));
        if let Support::Unsupported(reason) = &scenario.support {
            println!("{}", hint_message(format!("skipped: {reason}")));
        }
        println!("{}", format_with_gutter(&scenario.commands.join("\n")));
        println!("{}", hint_message("expect:"));
        println!("{}", format_with_gutter(&format_line_list(&scenario.expected)));
    }
    Ok(())
}
