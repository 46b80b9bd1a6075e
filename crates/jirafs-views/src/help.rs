pub const ROOT_HELP: &str = "\
ctl: global control file. Accepted commands:
\tsearch NAME JQL...
\t\tRuns the query and exposes the matching issues in a directory NAME at
\t\tthe root. Listing that directory re-runs the query; opening an issue
\t\tinside it does not.
\tpass-login [USER PASS]
\t\tLogs in again with the stored credentials, or with USER and PASS which
\t\tthen replace them.
\tset max-listing N
\t\tLimits how many entries any listing fetches.
projects/: one directory per project.
issues/: recent issues, plus new/ to create one.
NAME/: a saved search. Remove it to forget the search.

cat 'structure' for the full layout.
";

pub const ROOT_STRUCTURE: &str = "\
/
\tctl
\thelp
\tstructure
\tprojects/
\t\tABC/
\t\t\tcomponents
\t\t\tissuetypes
\t\t\traw
\t\t\tissues/
\t\t\t\tABC-1/
\t\t\t\t\t...
\t\t\t\tnew/
\t\t\t\t\t...
\t\t...
\tissues/
\t\thelp
\t\tstructure
\t\tnew/
\t\t\t...
\t\tABC-1/
\t\t\t...
\tNAME/
\t\tABC-7/
\t\t\t...
";

pub const ISSUES_HELP: &str = "\
new/: a draft issue with only the files needed to create it. Fill in
\tsummary, type, description and project (optional under a project), then
\twrite \"commit\" to ctl. The directory turns into the created issue; read
\tkey to learn the assigned key.
ABC-1/: issue 1 of project ABC.
ABC-1/comments/: one directory per comment. Writing the comment file adds a
\tcomment, writing NUMBER/comment edits one, removing NUMBER deletes it.
ABC-1/components, ABC-1/labels: one value per line. Writable.
ABC-1/ctl: \"delete\" removes the issue.
ABC-1/links: one link per line as \"INWARD OUTWARD RELATION\", for example
\t\"ABC-1 ABC-2 Blocks\". Writable; lines not naming this issue are ignored.
ABC-1/raw: the issue as JSON. Writing it sends the document as an update.
ABC-1/status: writing a status walks the workflow along the shortest chain
\tof transitions that reaches it.
ABC-1/transition: transitions available right now. Writing one runs it.

cat 'structure' for the layout of an issue.
";

pub const ISSUES_STRUCTURE: &str = "\
new/
\tctl
\tdescription
\tproject
\tsummary
\ttype
ABC-1/
\tassignee
\tcomments/
\t\t10001/
\t\t\tauthor
\t\t\tcomment
\t\t\tcreated
\t\t\tupdated
\t\t...
\t\tcomment
\tcomponents
\tcreator
\tctl
\tdescription
\tkey
\tlabels
\tlinks
\tpriority
\tprogress
\tproject
\traw
\treporter
\tresolution
\tstatus
\tsummary
\ttransition
\ttype
\tworklog/
\t\t20001/
\t\t\tauthor
\t\t\tcomment
\t\t\tstarted
\t\t\ttime
\t\t...
ABC-2/
\t...
";
