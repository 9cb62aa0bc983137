/// Statement clause being written, lets writers adapt the same construct per clause.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlSelect,
    SqlSelectFrom,
    SqlJoin,
    SqlSelectWhere,
    SqlSelectOrderBy,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlKeyInitialization,
    SqlUpdate,
    SqlUpdateSet,
    SqlDeleteFrom,
    SqlReadBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub fragment: Fragment,
    /// Prefix columns with their table alias.
    pub qualify_columns: bool,
}

impl Context {
    pub fn new(fragment: Fragment, qualify_columns: bool) -> Self {
        Self {
            fragment,
            qualify_columns,
        }
    }
    /// Same context for another clause.
    pub fn switch_fragment(&self, fragment: Fragment) -> Context {
        Context { fragment, ..*self }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Fragment::None, true)
    }
}
