use console::Style;
use taghistory::UpdateChannel;

pub fn header() -> Style {
    Style::new().bold().underlined()
}

pub fn name() -> Style {
    Style::new().bold()
}

pub fn hash() -> Style {
    Style::new().yellow()
}

pub fn muted() -> Style {
    Style::new().dim()
}

pub fn success() -> Style {
    Style::new().green()
}

pub fn warning() -> Style {
    Style::new().yellow().bold()
}

pub fn channel(channel: UpdateChannel) -> Style {
    match channel {
        UpdateChannel::Trunk => Style::new().cyan(),
        UpdateChannel::Devel => Style::new().blue(),
        UpdateChannel::Test => Style::new().magenta(),
        UpdateChannel::Prod => Style::new().green().bold(),
    }
}
