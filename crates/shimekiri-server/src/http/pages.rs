// SPDX-License-Identifier: Apache-2.0

//! Server-rendered pages, composed with `format!`.

use shimekiri_model::{DueStatus, Todo, TodoStatus, User};

pub(crate) fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn layout(title: &str, head_extra: &str, nav: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"ja\"><head><meta charset=\"utf-8\"><title>{title}</title>{head_extra}</head><body>\
<nav>{nav}</nav>\
{body}\
</body></html>"
    )
}

fn nav_links(user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            "<a href=\"/\">Home</a> <a href=\"/users/{nickname}\">マイページ</a> <a href=\"/auth/logout\">Logout</a>",
            nickname = html_escape(user.nickname.as_str())
        ),
        None => "<a href=\"/auth/callback\">Login</a>".to_string(),
    }
}

pub(crate) fn home_page(user: Option<&User>, near_due: u64) -> String {
    let banner = if near_due > 0 {
        format!("<p class=\"home__nearDue\">期日が明日までのTodoが{near_due}件あります</p>")
    } else {
        String::new()
    };
    let body = format!("<h1>Todo!!</h1>{banner}");
    layout("Todo!!", "", &nav_links(user), &body)
}

pub(crate) fn profile_page(owner: &User, todos: &[Todo], incomplete_only: bool) -> String {
    let nickname = html_escape(owner.nickname.as_str());
    let mut items = String::new();
    for todo in todos {
        let id = todo.id.as_i64();
        let (status_label, next_status) = match todo.status {
            TodoStatus::Incomplete => ("未完了", "1"),
            TodoStatus::Complete => ("完了", "0"),
        };
        items.push_str(&format!(
            "<li class=\"todo__item\">\
<a href=\"/todos/{id}\">{content}</a> \
<span class=\"todo__dueDate\">{due_date}</span> \
<span class=\"todo__status\">{status_label}</span>\
<form method=\"post\" action=\"/todos/{id}\"><input type=\"hidden\" name=\"status\" value=\"{next_status}\"><button class=\"todo__statusButton\">切替</button></form>\
<form method=\"post\" action=\"/todos/{id}/delete\"><button class=\"todo__deleteButton\">削除</button></form>\
</li>",
            content = html_escape(todo.content.as_str()),
            due_date = html_escape(todo.due_date.as_str()),
        ));
    }
    if items.is_empty() {
        items.push_str("<li>Todoはまだありません</li>");
    }
    let filter_links = if incomplete_only {
        format!("<a href=\"/users/{nickname}\">すべて</a>")
    } else {
        format!("<a href=\"/users/{nickname}?incomplete=1\">未完了のみ</a>")
    };
    let body = format!(
        "<h1>{name}のTodo</h1>\
<form class=\"todo\" method=\"post\" action=\"/todos\">\
<input name=\"content\" placeholder=\"やること\">\
<input name=\"due_date\" placeholder=\"2030-04-01\">\
<button class=\"todo__createButton\">作成</button>\
</form>\
<p>{filter_links}</p>\
<form method=\"post\" action=\"/todos/completed/delete\"><button class=\"todo__clearButton\">完了済みを一括削除</button></form>\
<ul class=\"todo__list\">{items}</ul>",
        name = html_escape(&owner.name),
    );
    layout("マイページ", "", &nav_links(Some(owner)), &body)
}

pub(crate) fn todo_page(todo: &Todo, due_status: DueStatus) -> String {
    let id = todo.id.as_i64();
    let verdict = match due_status {
        DueStatus::WithinDeadline => "<p class=\"todo__verdict\">期限内です</p>".to_string(),
        DueStatus::Overdue => format!(
            "<p class=\"todo__verdict\">\\ Twitterにシェアして反省しましょう!! /</p>\
<a href=\"https://twitter.com/intent/tweet?text={content}\">シェアする</a>",
            content = html_escape(todo.content.as_str()),
        ),
    };
    let head_extra = format!("<meta property=\"og:image\" content=\"/todos/{id}/ogp.png\">");
    let body = format!(
        "<h1>{content}</h1>\
<p class=\"todo__dueDate\">期日: {due_date}</p>\
{verdict}",
        content = html_escape(todo.content.as_str()),
        due_date = html_escape(todo.due_date.as_str()),
    );
    layout("Todo", &head_extra, "<a href=\"/\">Home</a>", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_covers_markup_characters() {
        assert_eq!(
            html_escape("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(html_escape("期限内です"), "期限内です");
    }

    #[test]
    fn home_page_banner_only_appears_with_near_due_todos() {
        let quiet = home_page(None, 0);
        assert!(quiet.contains("Todo!!"));
        assert!(!quiet.contains("期日が明日まで"));

        let busy = home_page(None, 3);
        assert!(busy.contains("期日が明日までのTodoが3件あります"));
    }
}
