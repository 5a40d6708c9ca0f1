//! Server-rendered booking pages.

use std::fmt::Write;

use chrono::NaiveDate;

use agenda_core::booking::{BookingForm, FormField};
use agenda_core::locale::{short_date, weekday_abbrev};
use agenda_core::slots::{PeriodSlots, Slot};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#f4f4f5;color:#18181b}\
main{max-width:40rem;margin:0 auto;padding:1.5rem}\
h1{font-size:1.5rem}\
.carousel{display:flex;gap:.5rem;align-items:center;overflow-x:auto}\
.day{display:flex;flex-direction:column;align-items:center;padding:.5rem .75rem;border-radius:.5rem;background:#fff;color:inherit;text-decoration:none}\
.day.selected{background:#18181b;color:#fff}\
.period{margin-top:1.5rem}\
.slots{display:flex;flex-wrap:wrap;gap:.5rem}\
.slot{padding:.5rem 1rem;border-radius:.5rem;background:#fff;color:inherit;text-decoration:none}\
.empty{color:#71717a}\
.modal{position:fixed;inset:0;background:rgba(0,0,0,.5);display:flex;align-items:center;justify-content:center}\
.modal form{background:#fff;padding:1.5rem;border-radius:.75rem;width:min(28rem,90vw)}\
.modal label{display:block;margin-top:.75rem}\
.error{color:#dc2626;font-size:.875rem}\
";

/// Escape text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n{head}</head>\n<body>\n<main>\n{body}</main>\n</body>\n</html>\n",
        escape(title)
    )
}

fn day_href(date: NaiveDate) -> String {
    format!("/?data={}", date.format("%Y-%m-%d"))
}

/// The booking form opened over the agenda for one slot.
pub struct FormView<'a> {
    pub slot: &'a Slot,
    pub values: &'a BookingForm,
    pub errors: &'a [FormField],
    /// Set when the calendar rejected the last submission.
    pub failed: bool,
}

pub struct AgendaView<'a> {
    pub today: NaiveDate,
    pub selected: NaiveDate,
    pub days: &'a [NaiveDate],
    pub slots: &'a PeriodSlots,
    pub services: &'a [String],
    pub form: Option<FormView<'a>>,
}

pub fn render_agenda(view: &AgendaView<'_>) -> String {
    let mut body = String::new();
    body.push_str("<h1>Escolha o seu horário</h1>\n");

    body.push_str("<nav class=\"carousel\">\n");
    if let Some(prev) = view.selected.pred_opt().filter(|_| view.selected > view.today) {
        let _ = writeln!(
            body,
            "<a class=\"nav prev\" href=\"{}\" aria-label=\"Dia anterior\">&lsaquo;</a>",
            day_href(prev)
        );
    }
    for day in view.days {
        let class = if *day == view.selected { "day selected" } else { "day" };
        let _ = writeln!(
            body,
            "<a class=\"{class}\" href=\"{}\"><span>{}</span><span>{}</span></a>",
            day_href(*day),
            weekday_abbrev(*day),
            short_date(*day)
        );
    }
    let before_last = view.days.last().is_some_and(|last| view.selected < *last);
    if let Some(next) = view.selected.succ_opt().filter(|_| before_last) {
        let _ = writeln!(
            body,
            "<a class=\"nav next\" href=\"{}\" aria-label=\"Próximo dia\">&rsaquo;</a>",
            day_href(next)
        );
    }
    body.push_str("</nav>\n");

    let date = view.selected.format("%Y-%m-%d");
    for (period, slots) in view.slots.groups() {
        let _ = writeln!(body, "<section class=\"period\">\n<h2>{}</h2>", period.title());
        if slots.is_empty() {
            body.push_str("<p class=\"empty\">Não há horários disponíveis nesse período.</p>\n");
        } else {
            body.push_str("<div class=\"slots\">\n");
            for slot in slots {
                let _ = writeln!(
                    body,
                    "<a class=\"slot\" href=\"/?data={date}&amp;horario={label}\">{label}</a>",
                    label = escape(&slot.label)
                );
            }
            body.push_str("</div>\n");
        }
        body.push_str("</section>\n");
    }

    if let Some(form) = &view.form {
        body.push_str(&render_form(view.selected, view.services, form));
    }

    layout("Agendamento", "", &body)
}

fn field_error(errors: &[FormField], field: FormField) -> String {
    if errors.contains(&field) {
        format!("<p class=\"error\">{}</p>\n", field.message())
    } else {
        String::new()
    }
}

fn render_form(date: NaiveDate, services: &[String], form: &FormView<'_>) -> String {
    let mut out = String::new();
    out.push_str("<div class=\"modal\">\n<form method=\"post\" action=\"/agendar\">\n");
    let _ = writeln!(
        out,
        "<h2>Você está agendando para {}</h2>",
        escape(&form.slot.label)
    );
    let _ = writeln!(
        out,
        "<input type=\"hidden\" name=\"data\" value=\"{}\">\n<input type=\"hidden\" name=\"horario\" value=\"{}\">",
        date.format("%Y-%m-%d"),
        escape(&form.slot.label)
    );

    if form.failed {
        out.push_str("<p class=\"error\">Não foi possível concluir o agendamento. Tente novamente.</p>\n");
    }

    out.push_str("<fieldset>\n<legend>Tipo de serviço</legend>\n");
    for service in services {
        let checked = if form.values.service == *service { " checked" } else { "" };
        let _ = writeln!(
            out,
            "<label><input type=\"radio\" name=\"servico\" value=\"{value}\"{checked}> {value}</label>",
            value = escape(service)
        );
    }
    out.push_str("</fieldset>\n");
    out.push_str(&field_error(form.errors, FormField::Service));

    let _ = writeln!(
        out,
        "<label>Nome <input type=\"text\" name=\"nome\" value=\"{}\"></label>",
        escape(&form.values.name)
    );
    out.push_str(&field_error(form.errors, FormField::Name));

    let _ = writeln!(
        out,
        "<label>Telefone <input type=\"tel\" name=\"telefone\" value=\"{}\"></label>",
        escape(&form.values.phone)
    );
    out.push_str(&field_error(form.errors, FormField::Phone));

    let _ = writeln!(
        out,
        "<button type=\"submit\">Confirmar Agendamento</button>\n<a href=\"{}\">Cancelar</a>",
        day_href(date)
    );
    out.push_str("</form>\n</div>\n");
    out
}

/// Confirmation page. Redirects to `whatsapp_url` after `delay_secs`.
pub fn render_confirmation(when: &str, whatsapp_url: &str, delay_secs: u64) -> String {
    let head = format!(
        "<meta http-equiv=\"refresh\" content=\"{delay_secs};url={}\">\n",
        escape(whatsapp_url)
    );
    let body = format!(
        "<h1>Agendamento Confirmado!</h1>\n\
         <p>Você tem um horário agendado para o dia <strong>{}</strong>.</p>\n\
         <p>Você será redirecionado para o WhatsApp em {delay_secs} segundos.</p>\n\
         <p><a href=\"{}\">Abrir WhatsApp</a></p>\n",
        escape(when),
        escape(whatsapp_url)
    );
    layout("Agendamento Confirmado", &head, &body)
}

pub fn render_no_booking() -> String {
    layout(
        "Agendamento",
        "",
        "<h1>Nenhum agendamento encontrado.</h1>\n<p><a href=\"/\">Voltar para a agenda</a></p>\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_core::slots::partition_by_period;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_escape_covers_markup() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_agenda_hides_previous_day_on_today() {
        let slots = partition_by_period(&[Slot::new(9, 0).unwrap()]);
        let days = vec![date(20), date(21)];
        let mut view = AgendaView {
            today: date(20),
            selected: date(20),
            days: &days,
            slots: &slots,
            services: &[],
            form: None,
        };

        let html = render_agenda(&view);
        assert!(!html.contains("Dia anterior"));
        assert!(html.contains("QUI"));
        assert!(html.contains("20/03"));
        assert!(html.contains("/?data=2025-03-20&amp;horario=09:00"));

        assert!(html.contains("href=\"/?data=2025-03-21\" aria-label=\"Próximo dia\""));

        view.selected = date(21);
        let html = render_agenda(&view);
        assert!(html.contains("href=\"/?data=2025-03-20\" aria-label=\"Dia anterior\""));
        assert!(!html.contains("Próximo dia"));
    }

    #[test]
    fn test_empty_periods_show_placeholder() {
        let slots = partition_by_period(&[Slot::new(14, 0).unwrap()]);
        let view = AgendaView {
            today: date(20),
            selected: date(20),
            days: &[],
            slots: &slots,
            services: &[],
            form: None,
        };

        let html = render_agenda(&view);
        assert_eq!(html.matches("Não há horários disponíveis nesse período.").count(), 2);
        assert!(html.contains("14:00"));
    }

    #[test]
    fn test_form_keeps_values_and_shows_errors() {
        let slot = Slot::new(9, 0).unwrap();
        let values = BookingForm {
            service: String::new(),
            name: "<Ana>".into(),
            phone: String::new(),
        };
        let services = vec!["Orçamento".to_string()];
        let slots = PeriodSlots::default();
        let view = AgendaView {
            today: date(20),
            selected: date(20),
            days: &[],
            slots: &slots,
            services: &services,
            form: Some(FormView {
                slot: &slot,
                values: &values,
                errors: &[FormField::Service, FormField::Phone],
                failed: false,
            }),
        };

        let html = render_agenda(&view);
        assert!(html.contains("Você está agendando para 09:00"));
        assert!(html.contains("value=\"&lt;Ana&gt;\""));
        assert!(html.contains("Selecione um tipo de serviço."));
        assert!(html.contains("Informe seu telefone"));
        assert!(!html.contains("Informe seu nome"));
    }

    #[test]
    fn test_confirmation_redirects_to_whatsapp() {
        let html = render_confirmation("20 de março às 09:00", "https://wa.me/55?text=a%20b", 5);
        assert!(html.contains("content=\"5;url=https://wa.me/55?text=a%20b\""));
        assert!(html.contains("<strong>20 de março às 09:00</strong>"));
    }
}
