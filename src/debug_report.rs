use parlance::{Context, DispatchOutcome, Dispatcher, EntityFilter, Rule};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(dispatcher: &Dispatcher, context: &Context, outcome: &DispatchOutcome, color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "\n{}",
        palette.bold(palette.paint(
            format!("⚙  Dispatching: domain={:?} intent={:?}", context.domain, context.intent),
            ansi::CYAN
        ))
    );
    if !context.entities.is_empty() {
        for entity in &context.entities {
            println!("   {} {} = {}", palette.dim("entity"), palette.paint(&entity.entity_type, ansi::BLUE), entity.value);
        }
    }

    // Rule table, in evaluation order
    println!("\n{}", palette.paint("━━━ Rules (evaluation order) ━━━", ansi::GRAY));
    for (idx, rule) in dispatcher.rules().iter().enumerate() {
        let marker = if outcome.dialogue_state.as_deref() == Some(rule.state()) && rule.matches(context) {
            palette.paint("→", ansi::GREEN)
        } else {
            palette.dim(" ")
        };
        println!(
            "  {} {} {} {} {}",
            marker,
            palette.paint(format!("[{:2}]", idx), ansi::GRAY),
            palette.paint(format!("spec {:>2}", rule.specificity().bits()), ansi::YELLOW),
            palette.bold(rule.state()),
            palette.dim(fmt_filters(rule)),
        );
    }

    // Outcome
    println!("\n{}", palette.paint("━━━ Outcome ━━━", ansi::GRAY));
    match &outcome.dialogue_state {
        Some(state) => println!("  state: {}", palette.bold(palette.paint(state, ansi::GREEN))),
        None => println!("  state: {} {}", palette.dim("(none)"), palette.dim("default handler ran")),
    }
    if outcome.client_actions.is_empty() {
        println!("  {}", palette.dim("No client actions emitted"));
    } else {
        for (idx, action) in outcome.client_actions.iter().enumerate() {
            println!(
                "  {} {} {} {}",
                palette.paint(format!("[{}]", idx), ansi::GRAY),
                palette.paint(&action.name, ansi::CYAN),
                palette.dim("│"),
                action.payload
            );
        }
    }
    println!();
}

fn fmt_filters(rule: &Rule) -> String {
    let mut parts = Vec::new();
    if let Some(domains) = rule.domains() {
        parts.push(format!("domains={:?}", domains));
    }
    if let Some(intents) = rule.intents() {
        parts.push(format!("intents={:?}", intents));
    }
    match rule.entities() {
        Some(EntityFilter::ByType(types)) => parts.push(format!("entity-types={:?}", types)),
        Some(EntityFilter::ByValue(values)) => parts.push(format!("entity-values={:?}", values)),
        None => {}
    }
    if parts.is_empty() { "matches everything".to_string() } else { parts.join(" ") }
}
