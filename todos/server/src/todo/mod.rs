use serde::{Deserialize, Serialize};

pub mod web;

/// Maximum length of a todo or todo list title, in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// A single task with a title and a completion flag.
///
/// The id is assigned at creation and never changes. Title length rules
/// are enforced by the caller before construction.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Todo {
    id: u32,
    title: String,
    done: bool,
}

impl Todo {
    pub fn new(id: u32, title: String) -> Self {
        Self {
            id,
            title,
            done: false,
        }
    }

    /// Returns the ID of the todo.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the title of the todo.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns whether the todo is completed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Marks the todo as completed. Idempotent.
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Marks the todo as not completed. Idempotent.
    pub fn mark_undone(&mut self) {
        self.done = false;
    }
}

/// A named, ordered collection of todos.
///
/// Insertion order of `todos` is preserved; display ordering is handled
/// separately by [`sort_todos`]. Title uniqueness across sibling lists is
/// the responsibility of the web layer's validation, not of this type.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct TodoList {
    id: u32,
    title: String,
    todos: Vec<Todo>,
}

impl TodoList {
    pub fn new(id: u32, title: String) -> Self {
        Self {
            id,
            title,
            todos: Vec::new(),
        }
    }

    /// Returns the ID of the todo list.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the title of the todo list.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replaces the title of the todo list.
    pub fn set_title(&mut self, new_title: String) {
        self.title = new_title;
    }

    /// Returns the todos in storage (insertion) order.
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// Appends a todo. The caller must ensure the id is fresh; no
    /// duplicate-id check is performed here.
    pub fn add(&mut self, todo: Todo) {
        self.todos.push(todo);
    }

    /// Removes and returns the todo at `index`, or `None` when the index
    /// is out of range.
    pub fn remove_at(&mut self, index: usize) -> Option<Todo> {
        if index < self.todos.len() {
            Some(self.todos.remove(index))
        } else {
            None
        }
    }

    /// Returns the index of the given todo, identified by id.
    pub fn find_index_of(&self, todo: &Todo) -> Option<usize> {
        self.todos.iter().position(|t| t.id() == todo.id())
    }

    /// Returns the todo with the given id, if present.
    pub fn find_todo(&self, todo_id: u32) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id() == todo_id)
    }

    /// Returns a mutable reference to the todo with the given id.
    pub fn find_todo_mut(&mut self, todo_id: u32) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id() == todo_id)
    }

    /// Returns true when the list is non-empty and every todo is done.
    ///
    /// An empty list is not considered complete; a freshly created list
    /// must not read as "all done".
    pub fn is_done(&self) -> bool {
        !self.todos.is_empty() && self.todos.iter().all(Todo::is_done)
    }

    /// Marks every contained todo as done.
    pub fn mark_all_done(&mut self) {
        for todo in &mut self.todos {
            todo.mark_done();
        }
    }

    /// Returns the number of todos in the list.
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Returns true when the list contains no todos.
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Returns the number of completed todos.
    pub fn done_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.is_done()).count()
    }

    /// Returns a fresh todo id for this list.
    ///
    /// Ids live in serialized session data, so the next id is derived
    /// from the todos currently in the list rather than from a counter.
    pub fn next_todo_id(&self) -> u32 {
        self.todos.iter().map(Todo::id).max().unwrap_or(0) + 1
    }
}

/// Plain serialized representation of a [`Todo`], as persisted in the
/// session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTodo {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// Plain serialized representation of a [`TodoList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTodoList {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub todos: Vec<StoredTodo>,
}

impl From<StoredTodo> for Todo {
    fn from(stored: StoredTodo) -> Self {
        Self {
            id: stored.id,
            title: stored.title,
            done: stored.done,
        }
    }
}

impl From<&Todo> for StoredTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title.clone(),
            done: todo.done,
        }
    }
}

impl From<StoredTodoList> for TodoList {
    fn from(stored: StoredTodoList) -> Self {
        Self {
            id: stored.id,
            title: stored.title,
            todos: stored.todos.into_iter().map(Todo::from).collect(),
        }
    }
}

impl From<&TodoList> for StoredTodoList {
    fn from(list: &TodoList) -> Self {
        Self {
            id: list.id,
            title: list.title.clone(),
            todos: list.todos.iter().map(StoredTodo::from).collect(),
        }
    }
}

/// Returns the todo lists ordered for display: lists that are not done
/// come first, then alphabetically by title ignoring case. The sort is
/// stable, so lists with equal titles keep their relative order. The
/// input sequence is left untouched.
pub fn sort_todo_lists(lists: &[TodoList]) -> Vec<TodoList> {
    let mut sorted = lists.to_vec();
    sorted.sort_by_key(|list| (list.is_done(), list.title().to_lowercase()));
    sorted
}

/// Returns the list's todos in display order: not done before done, then
/// alphabetically by title ignoring case. The list's own storage order
/// is unaffected.
pub fn sort_todos(todo_list: &TodoList) -> Vec<Todo> {
    let mut sorted = todo_list.todos().to_vec();
    sorted.sort_by_key(|todo| (todo.is_done(), todo.title().to_lowercase()));
    sorted
}

/// Finds the todo list with the given id. Ids are numeric; path
/// parameters must be parsed before calling.
pub fn find_todo_list(todo_list_id: u32, lists: &[TodoList]) -> Option<&TodoList> {
    lists.iter().find(|list| list.id() == todo_list_id)
}

/// Mutable counterpart of [`find_todo_list`].
pub fn find_todo_list_mut(todo_list_id: u32, lists: &mut [TodoList]) -> Option<&mut TodoList> {
    lists.iter_mut().find(|list| list.id() == todo_list_id)
}

/// Finds the todo with the given id in the given todo list. Returns
/// `None` immediately when the list itself was not found.
pub fn find_todo(todo_list: Option<&TodoList>, todo_id: u32) -> Option<&Todo> {
    todo_list?.find_todo(todo_id)
}

/// Validates a todo list title against the given sibling lists.
///
/// The title is expected to be trimmed already. All failing rules are
/// reported, not just the first: required, at most 100 characters, and
/// unique among existing list titles (case-sensitive exact match).
pub fn validate_list_title(title: &str, lists: &[TodoList]) -> Vec<String> {
    let mut errors = Vec::new();
    if title.is_empty() {
        errors.push("The list title is required.".to_string());
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push("List title must be between 1 and 100 characters.".to_string());
    }
    if lists.iter().any(|list| list.title() == title) {
        errors.push("List title must be unique.".to_string());
    }
    errors
}

/// Validates a todo title. Same length rules as list titles, without the
/// uniqueness requirement.
pub fn validate_todo_title(title: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if title.is_empty() {
        errors.push("The todo title is required.".to_string());
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push("Todo title must be between 1 and 100 characters.".to_string());
    }
    errors
}
