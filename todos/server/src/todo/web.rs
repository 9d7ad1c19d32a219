use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::session::{FlashMessage, TodoSession};
use crate::todo::{
    Todo, TodoList, find_todo, find_todo_list, find_todo_list_mut, sort_todo_lists, sort_todos,
    validate_list_title, validate_todo_title,
};
use crate::web::{AppState, WebError};

#[derive(Debug, Deserialize)]
pub struct TodoListTitleForm {
    #[serde(rename = "todoListTitle", default)]
    todo_list_title: String,
}

#[derive(Debug, Deserialize)]
pub struct TodoTitleForm {
    #[serde(rename = "todoTitle", default)]
    todo_title: String,
}

#[derive(Template)]
#[template(path = "lists.html")]
struct ListsTemplate {
    todo_lists: Vec<TodoList>,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "new_list.html")]
struct NewListTemplate {
    todo_list_title: String,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "list.html")]
struct ListTemplate {
    todo_list: TodoList,
    todos: Vec<Todo>,
    todo_title: String,
    flash: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "edit_list.html")]
struct EditListTemplate {
    todo_list: TodoList,
    todo_list_title: String,
    flash: Vec<FlashMessage>,
}

/// Handler for GET /lists that renders all todo lists in display order.
#[tracing::instrument(skip(state, jar))]
async fn lists_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);

    let template = ListsTemplate {
        todo_lists: sort_todo_lists(&session.todo_lists),
        flash: session.take_flash(),
    };
    state.sessions.persist(&session);

    let html = template.render().map_err(WebError::from)?;
    Ok((jar, Html(html).into_response()))
}

/// Handler for GET /lists/new that renders the new-list form.
#[tracing::instrument(skip(state, jar))]
async fn new_list_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);

    let template = NewListTemplate {
        todo_list_title: String::new(),
        flash: session.take_flash(),
    };
    state.sessions.persist(&session);

    let html = template.render().map_err(WebError::from)?;
    Ok((jar, Html(html).into_response()))
}

/// Handler for POST /lists that creates a new todo list.
///
/// On validation failure the form is re-rendered with the prior input
/// and all error messages; session data is left unchanged.
#[tracing::instrument(skip(state, jar, form))]
async fn create_list_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<TodoListTitleForm>,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);
    let title = form.todo_list_title.trim().to_string();

    let errors = validate_list_title(&title, &session.todo_lists);
    if errors.is_empty() {
        let id = session.next_list_id();
        session.add_list(TodoList::new(id, title));
        session.flash_success("The todo list has been created.");
        state.sessions.persist(&session);
        Ok((jar, Redirect::to("/lists").into_response()))
    } else {
        let template = NewListTemplate {
            todo_list_title: title,
            flash: errors.into_iter().map(FlashMessage::error).collect(),
        };
        let html = template.render().map_err(WebError::from)?;
        Ok((jar, Html(html).into_response()))
    }
}

/// Handler for GET /lists/{todo_list_id} that renders one todo list with
/// its todos in display order.
#[tracing::instrument(skip(state, jar))]
async fn list_handler(
    State(state): State<AppState>,
    Path(todo_list_id): Path<u32>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);
    let flash = session.take_flash();

    let Some(todo_list) = find_todo_list(todo_list_id, &session.todo_lists).cloned() else {
        state.sessions.persist(&session);
        return Err(WebError::NotFound);
    };
    state.sessions.persist(&session);

    let template = ListTemplate {
        todos: sort_todos(&todo_list),
        todo_list,
        todo_title: String::new(),
        flash,
    };
    let html = template.render().map_err(WebError::from)?;
    Ok((jar, Html(html).into_response()))
}

/// Handler for GET /lists/{todo_list_id}/edit that renders the rename form.
#[tracing::instrument(skip(state, jar))]
async fn edit_list_handler(
    State(state): State<AppState>,
    Path(todo_list_id): Path<u32>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);
    let flash = session.take_flash();

    let Some(todo_list) = find_todo_list(todo_list_id, &session.todo_lists).cloned() else {
        state.sessions.persist(&session);
        return Err(WebError::NotFound);
    };
    state.sessions.persist(&session);

    let template = EditListTemplate {
        todo_list_title: todo_list.title().to_string(),
        todo_list,
        flash,
    };
    let html = template.render().map_err(WebError::from)?;
    Ok((jar, Html(html).into_response()))
}

/// Handler for POST /lists/{todo_list_id}/edit that renames a todo list.
/// Title validation is identical to list creation.
#[tracing::instrument(skip(state, jar, form))]
async fn update_list_handler(
    State(state): State<AppState>,
    Path(todo_list_id): Path<u32>,
    jar: CookieJar,
    Form(form): Form<TodoListTitleForm>,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);
    let new_title = form.todo_list_title.trim().to_string();

    let errors = validate_list_title(&new_title, &session.todo_lists);
    let Some(list) = find_todo_list_mut(todo_list_id, &mut session.todo_lists) else {
        return Err(WebError::NotFound);
    };

    if errors.is_empty() {
        list.set_title(new_title);
        session.flash_success("The todo list has been renamed.");
        state.sessions.persist(&session);
        Ok((
            jar,
            Redirect::to(&format!("/lists/{todo_list_id}")).into_response(),
        ))
    } else {
        let template = EditListTemplate {
            todo_list: list.clone(),
            todo_list_title: new_title,
            flash: errors.into_iter().map(FlashMessage::error).collect(),
        };
        let html = template.render().map_err(WebError::from)?;
        Ok((jar, Html(html).into_response()))
    }
}

/// Handler for POST /lists/{todo_list_id}/destroy that deletes a todo
/// list together with all of its todos.
#[tracing::instrument(skip(state, jar))]
async fn destroy_list_handler(
    State(state): State<AppState>,
    Path(todo_list_id): Path<u32>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);

    match session.remove_list(todo_list_id) {
        Some(_) => {
            session.flash_success("The todo list has been deleted.");
            state.sessions.persist(&session);
            Ok((jar, Redirect::to("/lists").into_response()))
        }
        None => Err(WebError::NotFound),
    }
}

/// Handler for POST /lists/{todo_list_id}/complete_all that marks every
/// todo in the list as done.
#[tracing::instrument(skip(state, jar))]
async fn complete_all_handler(
    State(state): State<AppState>,
    Path(todo_list_id): Path<u32>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);

    let Some(list) = find_todo_list_mut(todo_list_id, &mut session.todo_lists) else {
        return Err(WebError::NotFound);
    };
    list.mark_all_done();
    session.flash_success("All todos were marked as done!");
    state.sessions.persist(&session);

    Ok((
        jar,
        Redirect::to(&format!("/lists/{todo_list_id}")).into_response(),
    ))
}

/// Handler for POST /lists/{todo_list_id}/todos that creates a todo in
/// the given list.
#[tracing::instrument(skip(state, jar, form))]
async fn create_todo_handler(
    State(state): State<AppState>,
    Path(todo_list_id): Path<u32>,
    jar: CookieJar,
    Form(form): Form<TodoTitleForm>,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);
    let title = form.todo_title.trim().to_string();

    let Some(list) = find_todo_list_mut(todo_list_id, &mut session.todo_lists) else {
        return Err(WebError::NotFound);
    };

    let errors = validate_todo_title(&title);
    if errors.is_empty() {
        let todo_id = list.next_todo_id();
        list.add(Todo::new(todo_id, title));
        session.flash_success("The todo has been created.");
        state.sessions.persist(&session);
        Ok((
            jar,
            Redirect::to(&format!("/lists/{todo_list_id}")).into_response(),
        ))
    } else {
        let todo_list = list.clone();
        let template = ListTemplate {
            todos: sort_todos(&todo_list),
            todo_list,
            todo_title: title,
            flash: errors.into_iter().map(FlashMessage::error).collect(),
        };
        let html = template.render().map_err(WebError::from)?;
        Ok((jar, Html(html).into_response()))
    }
}

struct ToggleOutcome {
    title: String,
    now_done: bool,
    list_done: bool,
}

/// Flips the completion state of a todo. Returns `None` when the list or
/// the todo does not exist.
fn toggle_todo(
    session: &mut TodoSession,
    todo_list_id: u32,
    todo_id: u32,
) -> Option<ToggleOutcome> {
    let list = find_todo_list_mut(todo_list_id, &mut session.todo_lists)?;
    let todo = list.find_todo_mut(todo_id)?;

    let now_done = !todo.is_done();
    if now_done {
        todo.mark_done();
    } else {
        todo.mark_undone();
    }
    let title = todo.title().to_string();
    let list_done = list.is_done();

    Some(ToggleOutcome {
        title,
        now_done,
        list_done,
    })
}

/// Handler for POST /lists/{todo_list_id}/todos/{todo_id}/toggle that
/// flips a todo's completion state.
#[tracing::instrument(skip(state, jar))]
async fn toggle_todo_handler(
    State(state): State<AppState>,
    Path((todo_list_id, todo_id)): Path<(u32, u32)>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);

    let Some(outcome) = toggle_todo(&mut session, todo_list_id, todo_id) else {
        return Err(WebError::NotFound);
    };

    if outcome.now_done {
        session.flash_success("Todo completed!");
        if outcome.list_done {
            session.flash_success("Congrats, all tasks done!");
        }
    } else {
        session.flash_success(format!("Completion for \"{}\" undone.", outcome.title));
    }
    state.sessions.persist(&session);

    Ok((
        jar,
        Redirect::to(&format!("/lists/{todo_list_id}")).into_response(),
    ))
}

/// Handler for POST /lists/{todo_list_id}/todos/{todo_id}/destroy that
/// permanently deletes a todo.
#[tracing::instrument(skip(state, jar))]
async fn destroy_todo_handler(
    State(state): State<AppState>,
    Path((todo_list_id, todo_id)): Path<(u32, u32)>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), WebError> {
    let (mut session, jar) = state.sessions.open(jar);

    let Some(list) = find_todo_list_mut(todo_list_id, &mut session.todo_lists) else {
        return Err(WebError::NotFound);
    };
    let todo = find_todo(Some(&*list), todo_id).cloned();
    let Some(index) = todo.as_ref().and_then(|todo| list.find_index_of(todo)) else {
        return Err(WebError::NotFound);
    };
    let _ = list.remove_at(index);

    session.flash_success("The todo has been deleted.");
    state.sessions.persist(&session);

    Ok((
        jar,
        Redirect::to(&format!("/lists/{todo_list_id}")).into_response(),
    ))
}

/// Creates and returns the todo router with all list and todo routes.
pub fn create_todo_router(state: AppState) -> Router {
    Router::new()
        .route("/lists", get(lists_handler).post(create_list_handler))
        .route("/lists/new", get(new_list_handler))
        .route("/lists/{todo_list_id}", get(list_handler))
        .route(
            "/lists/{todo_list_id}/edit",
            get(edit_list_handler).post(update_list_handler),
        )
        .route("/lists/{todo_list_id}/destroy", post(destroy_list_handler))
        .route(
            "/lists/{todo_list_id}/complete_all",
            post(complete_all_handler),
        )
        .route("/lists/{todo_list_id}/todos", post(create_todo_handler))
        .route(
            "/lists/{todo_list_id}/todos/{todo_id}/toggle",
            post(toggle_todo_handler),
        )
        .route(
            "/lists/{todo_list_id}/todos/{todo_id}/destroy",
            post(destroy_todo_handler),
        )
        .with_state(state)
}
